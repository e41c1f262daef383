//! Note values and the decomposition of durations into them
//!
//! A notated value is a base type (whole … 64th), optionally dotted once,
//! optionally inside a 3:2 triplet. Durations that are not a single value
//! are split into several, largest first; the caller ties the pieces.

use serde::Serialize;

use crate::models::QuarterLength;

/// Base note type, longest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl NoteType {
    pub const ALL: [NoteType; 7] = [
        NoteType::Whole,
        NoteType::Half,
        NoteType::Quarter,
        NoteType::Eighth,
        NoteType::Sixteenth,
        NoteType::ThirtySecond,
        NoteType::SixtyFourth,
    ];

    /// Undotted length in quarter notes
    pub fn length(&self) -> QuarterLength {
        match self {
            NoteType::Whole => QuarterLength::from_integer(4),
            NoteType::Half => QuarterLength::from_integer(2),
            NoteType::Quarter => QuarterLength::from_integer(1),
            NoteType::Eighth => QuarterLength::new(1, 2),
            NoteType::Sixteenth => QuarterLength::new(1, 4),
            NoteType::ThirtySecond => QuarterLength::new(1, 8),
            NoteType::SixtyFourth => QuarterLength::new(1, 16),
        }
    }

    /// MusicXML `<type>` value
    pub fn xml_name(&self) -> &'static str {
        match self {
            NoteType::Whole => "whole",
            NoteType::Half => "half",
            NoteType::Quarter => "quarter",
            NoteType::Eighth => "eighth",
            NoteType::Sixteenth => "16th",
            NoteType::ThirtySecond => "32nd",
            NoteType::SixtyFourth => "64th",
        }
    }

    /// Whether notes of this type carry flags (and so can be beamed)
    pub fn is_flagged(&self) -> bool {
        *self >= NoteType::Eighth
    }
}

/// A single notatable value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteValue {
    pub note_type: NoteType,
    pub dots: u8,
    /// Played as one of three in the time of two
    pub triplet: bool,
}

impl NoteValue {
    pub fn plain(note_type: NoteType) -> Self {
        Self { note_type, dots: 0, triplet: false }
    }

    pub fn dotted(note_type: NoteType) -> Self {
        Self { note_type, dots: 1, triplet: false }
    }

    pub fn triplet(note_type: NoteType) -> Self {
        Self { note_type, dots: 0, triplet: true }
    }

    /// Sounding length in quarter notes
    pub fn length(&self) -> QuarterLength {
        let mut length = self.note_type.length();
        if self.dots == 1 {
            length = length * QuarterLength::new(3, 2);
        }
        if self.triplet {
            length = length * QuarterLength::new(2, 3);
        }
        length
    }
}

/// Values tried for an exact match, in order of preference
fn exact_candidates() -> impl Iterator<Item = NoteValue> {
    let plain = NoteType::ALL.into_iter().map(NoteValue::plain);
    let dotted = NoteType::ALL[..6].iter().copied().map(NoteValue::dotted);
    let triplets = NoteType::ALL[1..].iter().copied().map(NoteValue::triplet);
    plain.chain(dotted).chain(triplets)
}

/// The single value whose length is exactly `length`
pub fn exact_value(length: QuarterLength) -> Option<NoteValue> {
    exact_candidates().find(|v| v.length() == length)
}

/// Split `length` into values, longest first. Plain values are preferred
/// for the leading pieces; triplet values are used once nothing plain fits.
/// `None` if the length cannot be written at all.
pub fn decompose(length: QuarterLength) -> Option<Vec<NoteValue>> {
    let zero = QuarterLength::from_integer(0);
    let mut remaining = length;
    let mut values = Vec::new();

    while remaining > zero {
        if let Some(value) = exact_value(remaining) {
            values.push(value);
            return Some(values);
        }
        let next = NoteType::ALL
            .into_iter()
            .map(NoteValue::plain)
            .find(|v| v.length() <= remaining)
            .or_else(|| {
                NoteType::ALL[1..]
                    .iter()
                    .copied()
                    .map(NoteValue::triplet)
                    .find(|v| v.length() <= remaining)
            })?;
        values.push(next);
        remaining -= next.length();
    }

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Split `length` into triplet values, largest first, falling back to
/// [`decompose`] for a remainder no triplet value fits
pub fn decompose_triplets(length: QuarterLength) -> Option<Vec<NoteValue>> {
    let zero = QuarterLength::from_integer(0);
    let mut remaining = length;
    let mut values = Vec::new();

    while remaining > zero {
        let next = NoteType::ALL[1..]
            .iter()
            .copied()
            .map(NoteValue::triplet)
            .find(|v| v.length() <= remaining);
        match next {
            Some(value) => {
                values.push(value);
                remaining -= value.length();
            }
            None => {
                values.extend(decompose(remaining)?);
                break;
            }
        }
    }

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
