//! Notation document types
//!
//! The assembled score is an owned tree with no back references:
//!
//! ```text
//! Score
//! └── Part (one key, one time signature, one clef)
//!     └── Measure
//!         └── NotationElement (Note | Rest)
//! ```
//!
//! Every measure's element durations add up exactly to the time
//! signature's capacity; `Measure::validate` checks that.

use serde::Serialize;

use super::duration::{NoteType, NoteValue};
use crate::models::serde_helpers::quarter_length;
use crate::models::{Accidental, KeySignature, QuarterLength, SpelledPitch, TimeSignature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TieType {
    Start,
    Continue,
    Stop,
}

impl TieType {
    /// Tie role of a piece given whether it connects backward and forward
    pub fn from_links(from_previous: bool, to_next: bool) -> Option<Self> {
        match (from_previous, to_next) {
            (false, true) => Some(TieType::Start),
            (true, true) => Some(TieType::Continue),
            (true, false) => Some(TieType::Stop),
            (false, false) => None,
        }
    }

    pub fn continues_previous(&self) -> bool {
        matches!(self, TieType::Continue | TieType::Stop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamState {
    Begin,
    Continue,
    End,
}

impl BeamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeamState::Begin => "begin",
            BeamState::Continue => "continue",
            BeamState::End => "end",
        }
    }
}

/// Tuplet information (time-modification in MusicXML)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TupletInfo {
    /// Actual notes in the tuplet (3 for a triplet)
    pub actual_notes: u8,
    /// Normal notes (2 for a triplet)
    pub normal_notes: u8,
    /// First element under the bracket
    pub bracket_start: bool,
    /// Last element under the bracket
    pub bracket_stop: bool,
}

impl TupletInfo {
    pub fn triplet() -> Self {
        Self { actual_notes: 3, normal_notes: 2, bracket_start: false, bracket_stop: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotatedNote {
    pub pitch: SpelledPitch,
    #[serde(with = "quarter_length")]
    pub duration: QuarterLength,
    pub note_type: NoteType,
    pub dots: u8,
    pub tuplet: Option<TupletInfo>,
    pub tie: Option<TieType>,
    pub beam: Option<BeamState>,
    /// Accidental sign to print, if any
    pub accidental: Option<Accidental>,
    pub voice: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotatedRest {
    #[serde(with = "quarter_length")]
    pub duration: QuarterLength,
    pub note_type: NoteType,
    pub dots: u8,
    pub tuplet: Option<TupletInfo>,
    pub voice: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotationElement {
    Note(NotatedNote),
    Rest(NotatedRest),
}

impl NotationElement {
    pub fn note(pitch: SpelledPitch, value: NoteValue) -> Self {
        NotationElement::Note(NotatedNote {
            pitch,
            duration: value.length(),
            note_type: value.note_type,
            dots: value.dots,
            tuplet: value.triplet.then(TupletInfo::triplet),
            tie: None,
            beam: None,
            accidental: None,
            voice: 0,
        })
    }

    pub fn rest(value: NoteValue) -> Self {
        NotationElement::Rest(NotatedRest {
            duration: value.length(),
            note_type: value.note_type,
            dots: value.dots,
            tuplet: value.triplet.then(TupletInfo::triplet),
            voice: 0,
        })
    }

    pub fn duration(&self) -> QuarterLength {
        match self {
            NotationElement::Note(n) => n.duration,
            NotationElement::Rest(r) => r.duration,
        }
    }

    pub fn note_type(&self) -> NoteType {
        match self {
            NotationElement::Note(n) => n.note_type,
            NotationElement::Rest(r) => r.note_type,
        }
    }

    pub fn tuplet(&self) -> Option<&TupletInfo> {
        match self {
            NotationElement::Note(n) => n.tuplet.as_ref(),
            NotationElement::Rest(r) => r.tuplet.as_ref(),
        }
    }

    pub fn tuplet_mut(&mut self) -> Option<&mut TupletInfo> {
        match self {
            NotationElement::Note(n) => n.tuplet.as_mut(),
            NotationElement::Rest(r) => r.tuplet.as_mut(),
        }
    }

    pub fn as_note(&self) -> Option<&NotatedNote> {
        match self {
            NotationElement::Note(n) => Some(n),
            NotationElement::Rest(_) => None,
        }
    }

    pub fn voice(&self) -> u8 {
        match self {
            NotationElement::Note(n) => n.voice,
            NotationElement::Rest(r) => r.voice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    /// 1-based measure number
    pub number: usize,
    pub elements: Vec<NotationElement>,
}

impl Measure {
    pub fn duration(&self) -> QuarterLength {
        self.elements.iter().map(|e| e.duration()).sum()
    }

    /// Whether the elements fill exactly `capacity`
    pub fn validate(&self, capacity: QuarterLength) -> bool {
        self.duration() == capacity
    }

    pub fn notes(&self) -> impl Iterator<Item = &NotatedNote> {
        self.elements.iter().filter_map(|e| e.as_note())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    pub fn sign(&self) -> &'static str {
        match self {
            Clef::Treble => "G",
            Clef::Bass => "F",
        }
    }

    pub fn line(&self) -> u8 {
        match self {
            Clef::Treble => 2,
            Clef::Bass => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    /// Part ID ("P1")
    pub id: String,
    pub name: String,
    pub clef: Clef,
    pub key: KeySignature,
    pub time: TimeSignature,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub title: Option<String>,
    pub parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;

    #[test]
    fn test_tie_links() {
        assert_eq!(TieType::from_links(false, true), Some(TieType::Start));
        assert_eq!(TieType::from_links(true, true), Some(TieType::Continue));
        assert_eq!(TieType::from_links(true, false), Some(TieType::Stop));
        assert_eq!(TieType::from_links(false, false), None);
    }

    #[test]
    fn test_measure_validate() {
        let c4 = SpelledPitch::new(Step::C, 0, 4);
        let measure = Measure {
            number: 1,
            elements: vec![
                NotationElement::note(c4, NoteValue::dotted(NoteType::Half)),
                NotationElement::rest(NoteValue::plain(NoteType::Eighth)),
            ],
        };
        assert_eq!(measure.duration(), QuarterLength::new(7, 2));
        assert!(!measure.validate(QuarterLength::from_integer(4)));
        assert!(measure.validate(QuarterLength::new(7, 2)));
        assert_eq!(measure.notes().count(), 1);
    }

    #[test]
    fn test_triplet_element_carries_ratio() {
        let rest = NotationElement::rest(NoteValue::triplet(NoteType::Eighth));
        let tuplet = rest.tuplet().unwrap();
        assert_eq!((tuplet.actual_notes, tuplet.normal_notes), (3, 2));
        assert_eq!(rest.duration(), QuarterLength::new(1, 3));
    }
}
