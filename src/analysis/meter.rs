//! Meter detection from onset periodicity
//!
//! Works on an accent table: one slot per grid unit holding the duration of
//! the note that starts there. Each candidate time signature is scored by
//!
//! - how well the accent pattern repeats one bar later (normalized
//!   autocorrelation at the bar lag), plus
//! - how much of the accent lands on the candidate's beats, minus what a
//!   uniform spread would put there.
//!
//! The first candidate is the default; another must beat it by more than
//! the margin.

use serde::Serialize;

use crate::models::note_event::to_f64;
use crate::models::{NoteEvent, QuarterLength, TimeSignature};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterScore {
    pub time: TimeSignature,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterEstimate {
    pub time: TimeSignature,
    /// Score of the chosen signature (0 on fallback)
    pub score: f64,
    /// Too little material to judge; the default was used
    pub fallback: bool,
    /// Every scored candidate, in candidate order
    pub scores: Vec<MeterScore>,
}

/// Accent per grid slot: the summed duration of notes starting in that slot
pub fn onset_accent_table(events: &[NoteEvent], grid: QuarterLength) -> Vec<f64> {
    let end = match events.iter().map(|e| e.end()).max() {
        Some(end) => end,
        None => return Vec::new(),
    };
    let slots = (end / grid).ceil().to_integer().max(0) as usize;
    let mut table = vec![0.0; slots];
    for event in events {
        let slot = (event.onset / grid).round().to_integer();
        if slot >= 0 && (slot as usize) < slots {
            table[slot as usize] += to_f64(event.duration);
        }
    }
    table
}

/// Length of `length` in grid slots, if it is a whole number of them
fn slots_in(length: QuarterLength, grid: QuarterLength) -> Option<usize> {
    let ratio = length / grid;
    if ratio.is_integer() && ratio > QuarterLength::from_integer(0) {
        Some(ratio.to_integer() as usize)
    } else {
        None
    }
}

/// Score one candidate, `None` if its bar is not a whole number of grid slots
pub fn score_meter(table: &[f64], grid: QuarterLength, time: &TimeSignature) -> Option<f64> {
    let lag = slots_in(time.measure_length(), grid)?;
    let total: f64 = table.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let periodicity = if table.len() > lag {
        let span = table.len() - lag;
        let matched: f64 = (0..span).map(|t| table[t] * table[t + lag]).sum();
        let energy: f64 = (0..span).map(|t| table[t] * table[t]).sum();
        if energy > 0.0 {
            matched / energy
        } else {
            0.0
        }
    } else {
        0.0
    };

    let beat_slots: Vec<usize> = time
        .beat_offsets()
        .into_iter()
        .filter_map(|offset| {
            let ratio = offset / grid;
            ratio.is_integer().then(|| ratio.to_integer() as usize)
        })
        .collect();
    let on_beat: f64 = table
        .iter()
        .enumerate()
        .filter(|(t, _)| beat_slots.contains(&(t % lag)))
        .map(|(_, a)| a)
        .sum();
    let chance = beat_slots.len() as f64 / lag as f64;

    Some(periodicity + on_beat / total - chance)
}

pub fn detect_meter(
    table: &[f64],
    grid: QuarterLength,
    candidates: &[TimeSignature],
    margin: f64,
    min_onsets: usize,
) -> MeterEstimate {
    let default = candidates.first().copied().unwrap_or_default();
    let fallback = |reason: &str| {
        log::debug!("meter: {}, using {}", reason, default);
        MeterEstimate { time: default, score: 0.0, fallback: true, scores: Vec::new() }
    };

    let onsets = table.iter().filter(|a| **a > 0.0).count();
    if onsets < min_onsets {
        return fallback(&format!("only {} onsets", onsets));
    }
    let baseline = match score_meter(table, grid, &default) {
        Some(score) => score,
        None => return fallback(&format!("grid {} does not divide a {} bar", grid, default)),
    };

    let scores: Vec<MeterScore> = candidates
        .iter()
        .filter_map(|time| score_meter(table, grid, time).map(|score| MeterScore { time: *time, score }))
        .collect();

    let mut chosen = MeterScore { time: default, score: baseline };
    for candidate in scores.iter().filter(|s| s.time != default) {
        if candidate.score > baseline + margin && candidate.score > chosen.score {
            chosen = *candidate;
        }
    }

    log::debug!("meter: {} (score {:.3}, default {} scored {:.3})", chosen.time, chosen.score, default, baseline);
    MeterEstimate { time: chosen.time, score: chosen.score, fallback: false, scores }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PitchContent;

    fn grid() -> QuarterLength {
        QuarterLength::new(1, 4)
    }

    fn candidates() -> Vec<TimeSignature> {
        ["4/4", "3/4", "6/8", "2/4"].iter().map(|s| s.parse().unwrap()).collect()
    }

    /// Repeat a rhythm (durations in eighths) `times` times
    fn rhythm(pattern: &[i64], times: usize) -> Vec<NoteEvent> {
        let mut onset = QuarterLength::from_integer(0);
        let mut events = Vec::new();
        for _ in 0..times {
            for eighths in pattern {
                let duration = QuarterLength::new(*eighths, 2);
                events.push(NoteEvent::new(onset, duration, PitchContent::Single(67)));
                onset += duration;
            }
        }
        events
    }

    fn detect(events: &[NoteEvent]) -> MeterEstimate {
        let table = onset_accent_table(events, grid());
        detect_meter(&table, grid(), &candidates(), 0.05, 4)
    }

    #[test]
    fn test_accent_table_slots() {
        let table = onset_accent_table(&rhythm(&[2, 1], 2), grid());
        assert_eq!(table.len(), 12);
        assert_eq!(table[0], 1.0);
        assert_eq!(table[4], 0.5);
        assert_eq!(table[6], 1.0);
        assert_eq!(table[1], 0.0);
    }

    #[test]
    fn test_steady_quarters_stay_in_common_time() {
        let estimate = detect(&rhythm(&[2], 16));
        assert_eq!(estimate.time.to_string(), "4/4");
        assert!(!estimate.fallback);
    }

    #[test]
    fn test_half_quarter_pattern_is_triple() {
        let estimate = detect(&rhythm(&[4, 2], 8));
        assert_eq!(estimate.time.to_string(), "3/4");
    }

    #[test]
    fn test_dotted_quarters_are_compound() {
        let estimate = detect(&rhythm(&[3], 16));
        assert_eq!(estimate.time.to_string(), "6/8");
    }

    #[test]
    fn test_waltz_figure() {
        let estimate = detect(&rhythm(&[2, 1, 1, 2], 8));
        assert_eq!(estimate.time.to_string(), "3/4");
    }

    #[test]
    fn test_too_few_onsets_fall_back() {
        let estimate = detect(&rhythm(&[3], 3));
        assert!(estimate.fallback);
        assert_eq!(estimate.time, TimeSignature::COMMON);
    }

    #[test]
    fn test_empty_table_falls_back() {
        let estimate = detect_meter(&[], grid(), &candidates(), 0.05, 0);
        assert!(estimate.fallback);
        assert_eq!(estimate.time, TimeSignature::COMMON);
    }

    #[test]
    fn test_margin_protects_default() {
        let table = onset_accent_table(&rhythm(&[4, 2], 8), grid());
        let estimate = detect_meter(&table, grid(), &candidates(), 1.0, 4);
        assert_eq!(estimate.time, TimeSignature::COMMON);
        assert_eq!(estimate.scores.len(), 4);
    }

    #[test]
    fn test_grid_not_dividing_bar() {
        let table = vec![1.0; 16];
        let five_eight: TimeSignature = "5/8".parse().unwrap();
        let estimate = detect_meter(&table, QuarterLength::new(2, 3), &[five_eight], 0.05, 4);
        assert!(estimate.fallback);
    }
}
