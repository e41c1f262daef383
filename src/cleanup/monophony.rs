//! Monophony reduction: keep the melodic top line
//!
//! Events sharing an onset compete; the one with the highest representative
//! pitch survives and the rest are discarded. On equal pitch the event that
//! came first wins. Chords collapse to their top note. This throws harmony
//! away on purpose: the target is a single-line instrument.
//!
//! Survivors at different onsets may still overlap, so each survivor is cut
//! back to end where the next one starts.

use crate::models::{NoteEvent, PitchContent};

#[derive(Debug, Clone, PartialEq)]
pub struct MonophonyOutcome {
    pub events: Vec<NoteEvent>,
    /// Events dropped because a higher (or earlier) event shared their onset
    pub discarded: usize,
    /// Survivors shortened to stop at the next onset
    pub truncated: usize,
}

pub fn reduce_to_monophony(mut events: Vec<NoteEvent>) -> MonophonyOutcome {
    // Stable: equal onsets keep their original order for the tie-break
    events.sort_by(|a, b| a.onset.cmp(&b.onset));

    let mut survivors: Vec<NoteEvent> = Vec::with_capacity(events.len());
    let mut discarded = 0;

    for event in events {
        match survivors.last_mut() {
            Some(current) if current.onset == event.onset => {
                discarded += 1;
                if event.representative_pitch() > current.representative_pitch() {
                    *current = collapse(event);
                }
            }
            _ => survivors.push(collapse(event)),
        }
    }

    let mut truncated = 0;
    for i in 1..survivors.len() {
        let next_onset = survivors[i].onset;
        let current = &mut survivors[i - 1];
        if current.end() > next_onset {
            current.duration = next_onset - current.onset;
            truncated += 1;
        }
    }

    if discarded > 0 || truncated > 0 {
        log::debug!("monophony: discarded {} simultaneous events, truncated {} overlaps", discarded, truncated);
    }

    MonophonyOutcome { events: survivors, discarded, truncated }
}

fn collapse(mut event: NoteEvent) -> NoteEvent {
    if event.pitch.is_chord() {
        event.pitch = PitchContent::Single(event.pitch.representative());
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuarterLength, Semitone};

    fn note(onset: i64, duration: i64, pitch: PitchContent) -> NoteEvent {
        NoteEvent::new(QuarterLength::new(onset, 4), QuarterLength::new(duration, 4), pitch)
    }

    #[test]
    fn test_highest_pitch_wins() {
        let out = reduce_to_monophony(vec![
            note(0, 4, PitchContent::Single(60)),
            note(0, 4, PitchContent::Single(64)),
        ]);
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].pitch, PitchContent::Single(64));
        assert_eq!(out.discarded, 1);
    }

    #[test]
    fn test_chord_collapses_to_top_note() {
        let out = reduce_to_monophony(vec![
            note(0, 4, PitchContent::Chord(vec![60, 67, 64])),
            note(0, 4, PitchContent::Single(65)),
        ]);
        assert_eq!(out.events[0].pitch, PitchContent::Single(67));
    }

    #[test]
    fn test_equal_pitch_keeps_first_in_original_order() {
        // Three simultaneous events on the same pitch, distinguishable by duration
        let out = reduce_to_monophony(vec![
            note(0, 2, PitchContent::Single(62)),
            note(0, 3, PitchContent::Single(62)),
            note(0, 4, PitchContent::Chord(vec![55, 62])),
        ]);
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].duration, QuarterLength::new(2, 4));
        assert_eq!(out.discarded, 2);
    }

    #[test]
    fn test_overlap_truncated_at_next_onset() {
        let out = reduce_to_monophony(vec![
            note(0, 8, PitchContent::Single(60)),
            note(4, 4, PitchContent::Single(62)),
        ]);
        assert_eq!(out.events[0].duration, QuarterLength::new(4, 4));
        assert_eq!(out.truncated, 1);
        let ends: Vec<_> = out.events.iter().map(|e| e.end()).collect();
        assert!(ends[0] <= out.events[1].onset);
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let out = reduce_to_monophony(vec![
            note(4, 4, PitchContent::Single(62)),
            note(0, 4, PitchContent::Single(60)),
        ]);
        let pitches: Vec<Semitone> = out.events.iter().map(|e| e.representative_pitch()).collect();
        assert_eq!(pitches, vec![60, 62]);
        assert_eq!(out.discarded, 0);
        assert_eq!(out.truncated, 0);
    }
}
