//! Clef choice from pitch content
//!
//! The median pitch decides: a line that mostly sits below G3 reads better
//! in bass clef. The median ignores a few stray extremes.

use super::types::Clef;
use crate::cleanup::SpelledEvent;
use crate::models::Semitone;

/// MIDI G3; lines with a lower median go to bass clef
const BASS_BELOW: Semitone = 55;

/// Guess the clef for a single melodic line
///
/// ```
/// use sheetgen_wasm::ir::clef::guess_clef;
/// use sheetgen_wasm::ir::types::Clef;
///
/// assert_eq!(guess_clef(&[]), Clef::Treble); // Empty lines default to treble
/// ```
pub fn guess_clef(events: &[SpelledEvent]) -> Clef {
    let mut midi_notes: Vec<Semitone> = events
        .iter()
        .filter_map(|e| e.top())
        .map(|p| p.midi())
        .collect();

    if midi_notes.is_empty() {
        return Clef::Treble;
    }

    midi_notes.sort_unstable();
    let median = midi_notes[midi_notes.len() / 2];

    if median < BASS_BELOW {
        Clef::Bass
    } else {
        Clef::Treble
    }
}
