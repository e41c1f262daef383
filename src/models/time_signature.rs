//! Time signatures and the measure/beat lengths they imply

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use super::note_event::QuarterLength;

/// Time signature, serialized as its display string ("6/8")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature { beats: 4, beat_type: 4 };

    /// Returns an error unless `beats > 0` and `beat_type` is a power of two up to 64
    pub fn new(beats: u8, beat_type: u8) -> Result<Self, String> {
        if beats == 0 {
            return Err("Time signature needs at least one beat".to_string());
        }
        if !beat_type.is_power_of_two() || beat_type > 64 {
            return Err(format!("Invalid beat type {} (must be 1, 2, 4, … 64)", beat_type));
        }
        Ok(Self { beats, beat_type })
    }

    /// Measure capacity in quarter lengths
    pub fn measure_length(&self) -> QuarterLength {
        Rational64::new(i64::from(self.beats) * 4, i64::from(self.beat_type))
    }

    /// 6/8, 9/8, 12/8 and similar: beats group in threes
    pub fn is_compound(&self) -> bool {
        self.beat_type >= 8 && self.beats > 3 && self.beats % 3 == 0
    }

    /// Length of one felt beat (a dotted quarter in 6/8)
    pub fn beat_length(&self) -> QuarterLength {
        let unit = Rational64::new(4, i64::from(self.beat_type));
        if self.is_compound() {
            unit * 3
        } else {
            unit
        }
    }

    /// Number of felt beats per measure
    pub fn beats_per_measure(&self) -> i64 {
        (self.measure_length() / self.beat_length()).to_integer()
    }

    /// Offsets of each felt beat from the start of the measure
    pub fn beat_offsets(&self) -> Vec<QuarterLength> {
        let beat = self.beat_length();
        (0..self.beats_per_measure()).map(|i| beat * i).collect()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

impl FromStr for TimeSignature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (beats, beat_type) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("Invalid time signature '{}' (expected e.g. \"3/4\")", s))?;
        let beats = beats
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("Invalid beat count in time signature '{}'", s))?;
        let beat_type = beat_type
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("Invalid beat type in time signature '{}'", s))?;
        TimeSignature::new(beats, beat_type)
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(value: TimeSignature) -> Self {
        value.to_string()
    }
}
