//! Key signatures: a position on the circle of fifths plus a mode

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::pitch::{name_at_fifths, parse_pitch_name, pitch_class_at_fifths, Accidental};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key signature (fifths: -7 to +7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignature {
    pub fifths: i8,
    pub mode: Mode,
}

/// Signature chosen for each major tonic pitch class.
/// Index = pitch class. F# gets sharps (+6), C#/Db gets flats (-5).
const MAJOR_FIFTHS_BY_TONIC: [i8; 12] = [0, -5, 2, -3, 4, -1, 6, 1, -4, 3, -2, 5];

impl KeySignature {
    pub const C_MAJOR: KeySignature = KeySignature { fifths: 0, mode: Mode::Major };

    /// Returns `None` when `fifths` is outside -7..=7
    pub fn new(fifths: i8, mode: Mode) -> Option<Self> {
        if (-7..=7).contains(&fifths) {
            Some(Self { fifths, mode })
        } else {
            None
        }
    }

    /// Conventional key for a tonic pitch class. Minor keys share the
    /// signature of their relative major.
    pub fn from_tonic(pitch_class: i16, mode: Mode) -> Self {
        let major_tonic = match mode {
            Mode::Major => pitch_class,
            Mode::Minor => pitch_class + 3,
        };
        let fifths = MAJOR_FIFTHS_BY_TONIC[major_tonic.rem_euclid(12) as usize];
        Self { fifths, mode }
    }

    /// Line-of-fifths position of the tonic (A minor = 3 when C major = 0)
    pub fn tonic_fifths(&self) -> i32 {
        match self.mode {
            Mode::Major => i32::from(self.fifths),
            Mode::Minor => i32::from(self.fifths) + 3,
        }
    }

    pub fn tonic_pitch_class(&self) -> i16 {
        pitch_class_at_fifths(self.tonic_fifths())
    }

    /// Tonic name without octave, e.g. "F#" or "Bb"
    pub fn tonic_name(&self) -> String {
        let (step, alter) = name_at_fifths(self.tonic_fifths());
        let sign = Accidental::for_alter(alter).map(|a| a.symbol()).unwrap_or("");
        format!("{}{}", step, sign)
    }

    /// Number of sharps or flats in the signature
    pub fn accidental_count(&self) -> u8 {
        self.fifths.unsigned_abs()
    }

    /// Whether line-of-fifths `position` is one of the seven signature notes
    pub fn is_diatonic(&self, position: i32) -> bool {
        let f = i32::from(self.fifths);
        (f - 1..=f + 5).contains(&position)
    }

    /// Alteration the signature applies to a letter (line-of-fifths order F C G D A E B)
    pub fn alter_for_step(&self, step: super::pitch::Step) -> i8 {
        let position = step.fifths_position();
        let f = i32::from(self.fifths);
        if f > 0 && position + 7 <= f + 5 {
            1
        } else if f < 0 && position - 7 >= f - 1 {
            -1
        } else {
            0
        }
    }
}

impl Default for KeySignature {
    fn default() -> Self {
        Self::C_MAJOR
    }
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic_name(), self.mode)
    }
}

impl FromStr for KeySignature {
    type Err = String;

    /// Parse "G major", "F# minor", "Bb", "c#m" (case-insensitive mode words)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut words = trimmed.split_whitespace();
        let first = words.next().ok_or_else(|| "Empty key signature".to_string())?;
        let rest = words.next().map(|w| w.to_lowercase());

        let (tonic_text, mode) = match rest.as_deref() {
            Some("major") | Some("maj") => (first, Mode::Major),
            Some("minor") | Some("min") => (first, Mode::Minor),
            Some(other) => return Err(format!("Invalid mode '{}' in key '{}'", other, trimmed)),
            None if first.len() > 1 && first.ends_with('m') => (&first[..first.len() - 1], Mode::Minor),
            None => (first, Mode::Major),
        };

        let (step, alter) = parse_pitch_name(tonic_text)
            .ok_or_else(|| format!("Invalid tonic '{}' in key '{}'", tonic_text, trimmed))?;
        let tonic_position = step.fifths_position() + 7 * i32::from(alter);
        let fifths = match mode {
            Mode::Major => tonic_position,
            Mode::Minor => tonic_position - 3,
        };
        i8::try_from(fifths)
            .ok()
            .and_then(|f| KeySignature::new(f, mode))
            .ok_or_else(|| format!("Key '{}' needs more than 7 accidentals", trimmed))
    }
}
