//! Range normalization: one uniform transposition into the instrument's range
//!
//! The whole stream moves by a single shift so melodic contour is kept.
//! A stream whose span is wider than the instrument's window cannot fit; it
//! is flagged rather than rejected.

use serde::{Deserialize, Serialize};

use crate::models::{NoteEvent, Semitone};

/// Playable pitch window, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRange {
    pub low: Semitone,
    pub high: Semitone,
}

impl InstrumentRange {
    /// G3 to A7
    pub const VIOLIN: InstrumentRange = InstrumentRange { low: 55, high: 100 };

    pub fn contains(&self, pitch: Semitone) -> bool {
        (self.low..=self.high).contains(&pitch)
    }

    /// Width of the window in semitones
    pub fn width(&self) -> Semitone {
        self.high - self.low
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.low > self.high {
            return Err(format!("range low {} is above range high {}", self.low, self.high));
        }
        if self.low < 0 || self.high > 127 {
            return Err(format!("range {}..={} leaves the MIDI key range", self.low, self.high));
        }
        Ok(())
    }
}

impl Default for InstrumentRange {
    fn default() -> Self {
        Self::VIOLIN
    }
}

/// What to do with pitches the single shift cannot bring into range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Shift only; leftovers stay where they are and are flagged
    #[default]
    SingleShift,
    /// Shift, then move each leftover pitch by whole octaves toward the window
    FoldOctaves,
}

/// Reported when the stream still leaves the window after the shift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeFlag {
    SpanExceedsRange {
        /// Distance from the lowest to the highest input pitch
        span: Semitone,
        /// Width of the instrument window
        window: Semitone,
        /// Pitches moved by octave folding (always 0 under `SingleShift`)
        folded: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeOutcome {
    pub events: Vec<NoteEvent>,
    /// Semitones added to every pitch
    pub shift: Semitone,
    pub flag: Option<RangeFlag>,
}

/// Uniform shift that brings the lowest (or else the highest) pitch into range
pub fn compute_shift(min: Semitone, max: Semitone, range: &InstrumentRange) -> Semitone {
    if min < range.low {
        range.low - min
    } else if max > range.high {
        range.high - max
    } else {
        0
    }
}

pub fn normalize_range(events: Vec<NoteEvent>, range: &InstrumentRange, policy: RangePolicy) -> RangeOutcome {
    let bounds = events
        .iter()
        .flat_map(|e| e.pitch.pitches().iter().copied())
        .fold(None, |acc: Option<(Semitone, Semitone)>, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
        });

    let (min, max) = match bounds {
        Some(b) => b,
        None => return RangeOutcome { events, shift: 0, flag: None },
    };

    let shift = compute_shift(min, max, range);
    if shift != 0 {
        log::debug!("range: transposing by {} semitones (input span {}..={})", shift, min, max);
    }

    let mut events: Vec<NoteEvent> = events
        .into_iter()
        .map(|mut e| {
            e.pitch = e.pitch.transposed(shift);
            e
        })
        .collect();

    let out_of_range = events
        .iter()
        .flat_map(|e| e.pitch.pitches().iter())
        .any(|p| !range.contains(*p));
    if !out_of_range {
        return RangeOutcome { events, shift, flag: None };
    }

    let mut folded = 0;
    if policy == RangePolicy::FoldOctaves {
        for event in events.iter_mut() {
            event.pitch = event.pitch.map(|p| {
                let moved = fold_into(p, range);
                if moved != p {
                    folded += 1;
                }
                moved
            });
        }
    }

    let span = max - min;
    log::warn!(
        "range: pitch span {} exceeds the {}-semitone window {}..={} ({} pitches folded)",
        span,
        range.width(),
        range.low,
        range.high,
        folded
    );

    RangeOutcome {
        events,
        shift,
        flag: Some(RangeFlag::SpanExceedsRange { span, window: range.width(), folded }),
    }
}

/// Move `pitch` by octaves toward the window, stopping before it overshoots
fn fold_into(pitch: Semitone, range: &InstrumentRange) -> Semitone {
    let mut p = pitch;
    while p < range.low && p + 12 <= range.high {
        p += 12;
    }
    while p > range.high && p - 12 >= range.low {
        p -= 12;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PitchContent, QuarterLength};

    fn note(onset: i64, pitch: Semitone) -> NoteEvent {
        NoteEvent::new(QuarterLength::from_integer(onset), QuarterLength::from_integer(1), PitchContent::Single(pitch))
    }

    fn pitches(events: &[NoteEvent]) -> Vec<Semitone> {
        events.iter().map(|e| e.representative_pitch()).collect()
    }

    #[test]
    fn test_shift_up_when_below() {
        let out = normalize_range(vec![note(0, 50), note(1, 52), note(2, 55)], &InstrumentRange::VIOLIN, RangePolicy::SingleShift);
        assert_eq!(out.shift, 5);
        assert_eq!(pitches(&out.events), vec![55, 57, 60]);
        assert!(out.flag.is_none());
    }

    #[test]
    fn test_shift_down_when_above() {
        let out = normalize_range(vec![note(0, 96), note(1, 104)], &InstrumentRange::VIOLIN, RangePolicy::SingleShift);
        assert_eq!(out.shift, -4);
        assert_eq!(pitches(&out.events), vec![92, 100]);
    }

    #[test]
    fn test_in_range_untouched() {
        let input = vec![note(0, 60), note(1, 72)];
        let out = normalize_range(input.clone(), &InstrumentRange::VIOLIN, RangePolicy::SingleShift);
        assert_eq!(out.shift, 0);
        assert_eq!(out.events, input);
    }

    #[test]
    fn test_chord_pitches_shift_together() {
        let chord = NoteEvent::new(
            QuarterLength::from_integer(0),
            QuarterLength::from_integer(1),
            PitchContent::Chord(vec![48, 52, 55]),
        );
        let out = normalize_range(vec![chord], &InstrumentRange::VIOLIN, RangePolicy::SingleShift);
        assert_eq!(out.shift, 7);
        assert_eq!(out.events[0].pitch, PitchContent::Chord(vec![55, 59, 62]));
    }

    #[test]
    fn test_wide_span_flagged_not_rejected() {
        let out = normalize_range(vec![note(0, 40), note(1, 100)], &InstrumentRange::VIOLIN, RangePolicy::SingleShift);
        assert_eq!(out.shift, 15);
        assert_eq!(pitches(&out.events), vec![55, 115]);
        assert_eq!(
            out.flag,
            Some(RangeFlag::SpanExceedsRange { span: 60, window: 45, folded: 0 })
        );
    }

    #[test]
    fn test_fold_policy_brings_leftovers_in() {
        let out = normalize_range(vec![note(0, 40), note(1, 100)], &InstrumentRange::VIOLIN, RangePolicy::FoldOctaves);
        assert_eq!(pitches(&out.events), vec![55, 91]);
        assert_eq!(
            out.flag,
            Some(RangeFlag::SpanExceedsRange { span: 60, window: 45, folded: 1 })
        );
    }

    #[test]
    fn test_empty_input() {
        let out = normalize_range(Vec::new(), &InstrumentRange::VIOLIN, RangePolicy::SingleShift);
        assert_eq!(out.shift, 0);
        assert!(out.events.is_empty());
        assert!(out.flag.is_none());
    }
}
