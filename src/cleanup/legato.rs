//! Legato gap filling
//!
//! A short silence between two notes is usually a detection gap, not a
//! rest. Gaps strictly shorter than the threshold are closed by extending
//! the earlier note; longer silences stay as rests.

use crate::models::{NoteEvent, QuarterLength};

#[derive(Debug, Clone, PartialEq)]
pub struct LegatoOutcome {
    pub events: Vec<NoteEvent>,
    pub closed: usize,
}

pub fn fill_gaps(mut events: Vec<NoteEvent>, threshold: QuarterLength) -> LegatoOutcome {
    let zero = QuarterLength::from_integer(0);
    let mut closed = 0;

    for i in 1..events.len() {
        let next_onset = events[i].onset;
        let current = &mut events[i - 1];
        let gap = next_onset - current.end();
        if gap > zero && gap < threshold {
            current.duration += gap;
            closed += 1;
        }
    }

    if closed > 0 {
        log::debug!("legato: closed {} gaps shorter than {}", closed, threshold);
    }
    LegatoOutcome { events, closed }
}
