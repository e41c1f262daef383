//! Enharmonic spelling on the line of fifths
//!
//! Each pitch class has one or two spellings with at most one accidental
//! (positions -8 Fb through 12 B#). The key decides:
//!
//! 1. a spelling inside the key's seven diatonic positions wins;
//! 2. in minor, the raised sixth and leading tone are accepted as well;
//! 3. otherwise the spelling closest to the key's centre (`fifths + 2`)
//!    wins, sharps on a tie.
//!
//! Without a key the rules run against C major.

use serde::Serialize;

use crate::models::pitch::pitch_class_at_fifths;
use crate::models::serde_helpers::quarter_length;
use crate::models::{KeySignature, Mode, NoteEvent, QuarterLength, Semitone, SpelledPitch};

const LOWEST_POSITION: i32 = -8;
const HIGHEST_POSITION: i32 = 12;

/// Note event whose pitches have been given letter names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpelledEvent {
    #[serde(with = "quarter_length")]
    pub onset: QuarterLength,
    #[serde(with = "quarter_length")]
    pub duration: QuarterLength,
    pub pitches: Vec<SpelledPitch>,
}

impl SpelledEvent {
    pub fn end(&self) -> QuarterLength {
        self.onset + self.duration
    }

    /// Highest spelled pitch
    pub fn top(&self) -> Option<SpelledPitch> {
        self.pitches.iter().copied().max_by_key(|p| p.midi())
    }
}

/// Line-of-fifths positions naming `pitch_class`, lowest first
fn candidates(pitch_class: i16) -> impl Iterator<Item = i32> {
    (LOWEST_POSITION..=HIGHEST_POSITION).filter(move |q| pitch_class_at_fifths(*q) == pitch_class)
}

/// Choose the line-of-fifths position for a pitch class in `key`
pub fn spelling_position(pitch_class: i16, key: &KeySignature) -> i32 {
    let f = i32::from(key.fifths);
    let options: Vec<i32> = candidates(pitch_class.rem_euclid(12)).collect();

    if let Some(q) = options.iter().copied().find(|q| key.is_diatonic(*q)) {
        return q;
    }
    if key.mode == Mode::Minor {
        if let Some(q) = options.iter().copied().find(|q| *q == f + 6 || *q == f + 8) {
            return q;
        }
    }

    let centre = f + 2;
    options
        .iter()
        .copied()
        .min_by_key(|q| ((q - centre).abs(), -q))
        .unwrap_or_else(|| i32::from(pitch_class) * 7 % 12)
}

/// Spell one semitone, with or without key context
pub fn spell_pitch(semitone: Semitone, key: Option<&KeySignature>) -> SpelledPitch {
    let key = key.copied().unwrap_or_default();
    let position = spelling_position(semitone.rem_euclid(12), &key);
    SpelledPitch::from_fifths_position(position, semitone)
}

pub fn spell_events(events: &[NoteEvent], key: Option<&KeySignature>) -> Vec<SpelledEvent> {
    events
        .iter()
        .map(|e| SpelledEvent {
            onset: e.onset,
            duration: e.duration,
            pitches: e.pitch.pitches().iter().map(|p| spell_pitch(*p, key)).collect(),
        })
        .collect()
}
