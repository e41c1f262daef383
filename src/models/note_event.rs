//! Note events as they travel through the cleanup stages
//!
//! `RawNoteEvent` is what the inference collaborator hands over. `NoteEvent`
//! is the working form: it remembers the duration it arrived with so later
//! stages can judge audibility on it after quantization has rounded the
//! working duration.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use super::serde_helpers::{quarter_length, rational_from_f64, MAX_DENOMINATOR};

/// Time and duration, measured in quarter notes
pub type QuarterLength = Rational64;

/// Absolute semitone number (MIDI numbering, 60 = middle C)
pub type Semitone = i16;

/// Highest semitone accepted on input (MIDI key range)
pub const MAX_SEMITONE: Semitone = 127;

/// Latest time accepted on input: onset plus duration, in quarter notes
pub const MAX_QUARTER_LENGTH: i64 = 100_000;

/// Pitch content of one event: a single pitch or a simultaneous chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PitchContent {
    Single(Semitone),
    Chord(Vec<Semitone>),
}

impl PitchContent {
    /// All pitches carried by this event
    pub fn pitches(&self) -> &[Semitone] {
        match self {
            PitchContent::Single(p) => std::slice::from_ref(p),
            PitchContent::Chord(ps) => ps,
        }
    }

    /// The pitch used when the event must be reduced to one: the chord's highest note
    pub fn representative(&self) -> Semitone {
        match self {
            PitchContent::Single(p) => *p,
            PitchContent::Chord(ps) => ps.iter().copied().max().unwrap_or(Semitone::MIN),
        }
    }

    pub fn lowest(&self) -> Option<Semitone> {
        self.pitches().iter().copied().min()
    }

    pub fn highest(&self) -> Option<Semitone> {
        self.pitches().iter().copied().max()
    }

    pub fn is_chord(&self) -> bool {
        matches!(self, PitchContent::Chord(_))
    }

    /// Apply `f` to every pitch, keeping the single/chord shape
    pub fn map(&self, mut f: impl FnMut(Semitone) -> Semitone) -> Self {
        match self {
            PitchContent::Single(p) => PitchContent::Single(f(*p)),
            PitchContent::Chord(ps) => PitchContent::Chord(ps.iter().map(|p| f(*p)).collect()),
        }
    }

    pub fn transposed(&self, shift: Semitone) -> Self {
        self.map(|p| p + shift)
    }
}

/// Lossy conversion for weighting and scoring
pub fn to_f64(value: QuarterLength) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// Event as produced by the pitch-inference model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNoteEvent {
    #[serde(with = "quarter_length")]
    pub onset: QuarterLength,
    #[serde(with = "quarter_length")]
    pub duration: QuarterLength,
    pub pitch: PitchContent,
}

impl RawNoteEvent {
    pub fn new(onset: QuarterLength, duration: QuarterLength, pitch: PitchContent) -> Self {
        Self { onset, duration, pitch }
    }

    /// Build from decimal quarter lengths. Values that cannot be represented
    /// fall back to zero and are rejected at ingestion.
    pub fn from_f64(onset: f64, duration: f64, pitch: PitchContent) -> Self {
        Self {
            onset: rational_from_f64(onset).unwrap_or_default(),
            duration: rational_from_f64(duration).unwrap_or_default(),
            pitch,
        }
    }

    pub fn single(onset: f64, duration: f64, pitch: Semitone) -> Self {
        Self::from_f64(onset, duration, PitchContent::Single(pitch))
    }

    pub fn chord(onset: f64, duration: f64, pitches: &[Semitone]) -> Self {
        Self::from_f64(onset, duration, PitchContent::Chord(pitches.to_vec()))
    }

    /// Check the inference contract for this event, returning the reason it is malformed
    pub fn check(&self) -> Result<(), String> {
        if self.onset < QuarterLength::from_integer(0) {
            return Err(format!("negative onset {}", self.onset));
        }
        if self.duration <= QuarterLength::from_integer(0) {
            return Err(format!("non-positive duration {}", self.duration));
        }
        for value in [self.onset, self.duration] {
            if *value.denom() > MAX_DENOMINATOR {
                return Err(format!("time value {} is finer than 1/{}", value, MAX_DENOMINATOR));
            }
        }
        // Both parts are bounded before the sum, so the addition cannot overflow
        let limit = QuarterLength::from_integer(MAX_QUARTER_LENGTH);
        if self.onset > limit || self.duration > limit || self.onset + self.duration > limit {
            return Err(format!(
                "event ending at {} + {} lies beyond {} quarter notes",
                self.onset, self.duration, MAX_QUARTER_LENGTH
            ));
        }
        let pitches = self.pitch.pitches();
        if pitches.is_empty() {
            return Err("empty chord".to_string());
        }
        if let Some(bad) = pitches.iter().find(|p| !(0..=MAX_SEMITONE).contains(*p)) {
            return Err(format!("pitch {} outside 0..={}", bad, MAX_SEMITONE));
        }
        Ok(())
    }
}

/// Working event inside the cleanup pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    #[serde(with = "quarter_length")]
    pub onset: QuarterLength,
    #[serde(with = "quarter_length")]
    pub duration: QuarterLength,
    /// Duration as received from inference, untouched by quantization
    #[serde(with = "quarter_length")]
    pub raw_duration: QuarterLength,
    pub pitch: PitchContent,
}

impl NoteEvent {
    pub fn new(onset: QuarterLength, duration: QuarterLength, pitch: PitchContent) -> Self {
        Self { onset, duration, raw_duration: duration, pitch }
    }

    pub fn end(&self) -> QuarterLength {
        self.onset + self.duration
    }

    pub fn representative_pitch(&self) -> Semitone {
        self.pitch.representative()
    }
}

impl From<RawNoteEvent> for NoteEvent {
    fn from(raw: RawNoteEvent) -> Self {
        NoteEvent::new(raw.onset, raw.duration, raw.pitch)
    }
}
