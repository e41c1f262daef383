//! Spelled pitches: letter name, chromatic alteration and octave
//!
//! Spellings are addressed by their position on the line of fifths
//! (… Bb=-2, F=-1, C=0, G=1, D=2 …), which makes key-relative choices a
//! matter of integer distance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::note_event::Semitone;

/// Diatonic step (letter name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

/// Letters in line-of-fifths order starting at F (position -1)
const FIFTHS_ORDER: [Step; 7] = [Step::F, Step::C, Step::G, Step::D, Step::A, Step::E, Step::B];

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
            Step::A => "A",
            Step::B => "B",
        }
    }

    /// Pitch class of the natural letter
    pub fn pitch_class(&self) -> i16 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    /// Line-of-fifths position of the natural letter (F=-1 … B=5)
    pub fn fifths_position(&self) -> i32 {
        match self {
            Step::F => -1,
            Step::C => 0,
            Step::G => 1,
            Step::D => 2,
            Step::A => 3,
            Step::E => 4,
            Step::B => 5,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accidental sign shown in front of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Sign that makes a note with `alter` explicit
    pub fn for_alter(alter: i8) -> Option<Self> {
        match alter {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            0 => Some(Accidental::Natural),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    /// MusicXML `<accidental>` value
    pub fn xml_name(&self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "flat-flat",
            Accidental::Flat => "flat",
            Accidental::Natural => "natural",
            Accidental::Sharp => "sharp",
            Accidental::DoubleSharp => "double-sharp",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }
}

/// A pitch with a chosen letter name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpelledPitch {
    pub step: Step,
    pub alter: i8,
    /// Scientific octave (middle C = C4)
    pub octave: i8,
}

impl SpelledPitch {
    pub fn new(step: Step, alter: i8, octave: i8) -> Self {
        Self { step, alter, octave }
    }

    /// Spell `semitone` with the name found at line-of-fifths `position`.
    ///
    /// The caller guarantees the position names the semitone's pitch class.
    pub fn from_fifths_position(position: i32, semitone: Semitone) -> Self {
        let (step, alter) = name_at_fifths(position);
        let natural = i32::from(step.pitch_class()) + i32::from(alter);
        let octave = (i32::from(semitone) - natural).div_euclid(12) - 1;
        Self { step, alter, octave: octave as i8 }
    }

    /// MIDI semitone number
    pub fn midi(&self) -> Semitone {
        (i16::from(self.octave) + 1) * 12 + self.step.pitch_class() + i16::from(self.alter)
    }

    /// Line-of-fifths position of this spelling
    pub fn fifths_position(&self) -> i32 {
        self.step.fifths_position() + 7 * i32::from(self.alter)
    }

    /// Name without octave, e.g. "F#" or "Bb"
    pub fn name(&self) -> String {
        let sign = Accidental::for_alter(self.alter).map(|a| a.symbol()).unwrap_or("");
        format!("{}{}", self.step, sign)
    }
}

impl fmt::Display for SpelledPitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

impl FromStr for SpelledPitch {
    type Err = String;

    /// Parse names like "C4", "F#5", "Bb3"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| format!("Missing octave in pitch '{}'", s))?;
        let (name, octave) = s.split_at(split);
        let octave: i8 = octave
            .parse()
            .map_err(|_| format!("Invalid octave in pitch '{}'", s))?;
        let (step, alter) = parse_pitch_name(name).ok_or_else(|| format!("Invalid pitch name: '{}'", name))?;
        Ok(SpelledPitch { step, alter, octave })
    }
}

/// Letter and alteration at a line-of-fifths position
pub fn name_at_fifths(position: i32) -> (Step, i8) {
    let shifted = position + 1;
    let step = FIFTHS_ORDER[shifted.rem_euclid(7) as usize];
    let alter = shifted.div_euclid(7) as i8;
    (step, alter)
}

/// Pitch class named by a line-of-fifths position
pub fn pitch_class_at_fifths(position: i32) -> i16 {
    (7 * position).rem_euclid(12) as i16
}

/// Parse a pitch name without octave ("C", "f#", "Bb", "Ebb")
pub fn parse_pitch_name(name: &str) -> Option<(Step, i8)> {
    let mut chars = name.chars();
    let step = match chars.next()?.to_ascii_uppercase() {
        'C' => Step::C,
        'D' => Step::D,
        'E' => Step::E,
        'F' => Step::F,
        'G' => Step::G,
        'A' => Step::A,
        'B' => Step::B,
        _ => return None,
    };
    let mut alter: i8 = 0;
    for c in chars {
        match c {
            '#' | '♯' | 's' => alter += 1,
            'b' | '♭' => alter -= 1,
            _ => return None,
        }
    }
    if alter.abs() > 2 {
        return None;
    }
    Some((step, alter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_at_fifths() {
        assert_eq!(name_at_fifths(0), (Step::C, 0));
        assert_eq!(name_at_fifths(6), (Step::F, 1));
        assert_eq!(name_at_fifths(-2), (Step::B, -1));
        assert_eq!(name_at_fifths(12), (Step::B, 1));
        assert_eq!(name_at_fifths(-8), (Step::F, -1));
    }

    #[test]
    fn test_pitch_class_at_fifths() {
        assert_eq!(pitch_class_at_fifths(1), 7);
        assert_eq!(pitch_class_at_fifths(-1), 5);
        assert_eq!(pitch_class_at_fifths(-5), 1);
        assert_eq!(pitch_class_at_fifths(7), 1);
    }

    #[test]
    fn test_octave_follows_letter() {
        // Cb4 sounds as B3, B#3 sounds as C4
        let c_flat = SpelledPitch::from_fifths_position(-7, 59);
        assert_eq!(c_flat, SpelledPitch::new(Step::C, -1, 4));
        assert_eq!(c_flat.midi(), 59);

        let b_sharp = SpelledPitch::from_fifths_position(12, 60);
        assert_eq!(b_sharp, SpelledPitch::new(Step::B, 1, 3));
        assert_eq!(b_sharp.midi(), 60);
    }

    #[test]
    fn test_display_and_parse() {
        let pitch = SpelledPitch::new(Step::F, 1, 5);
        assert_eq!(pitch.to_string(), "F#5");
        assert_eq!("F#5".parse::<SpelledPitch>().unwrap(), pitch);
        assert_eq!("Bb3".parse::<SpelledPitch>().unwrap().midi(), 58);
        assert!("H4".parse::<SpelledPitch>().is_err());
        assert!("C".parse::<SpelledPitch>().is_err());
    }

    #[test]
    fn test_accidental_for_alter() {
        assert_eq!(Accidental::for_alter(-1), Some(Accidental::Flat));
        assert_eq!(Accidental::for_alter(0).map(|a| a.xml_name()), Some("natural"));
        assert_eq!(Accidental::for_alter(3), None);
    }
}
