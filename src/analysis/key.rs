//! Key detection by profile correlation
//!
//! The duration-weighted pitch-class histogram is compared with the
//! Krumhansl-Kessler major and minor profiles rotated to all twelve tonics.
//! The best Pearson correlation wins. Near-ties go to the key with fewer
//! accidentals, then to major, then to the lower tonic.

use serde::Serialize;

use crate::models::note_event::to_f64;
use crate::models::{KeySignature, Mode, NoteEvent};

/// Krumhansl-Kessler probe-tone ratings, tonic first
pub const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];
pub const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Correlations closer than this are treated as equal
const TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyCandidate {
    pub key: KeySignature,
    pub tonic: i16,
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyEstimate {
    /// Chosen key (C major when inconclusive)
    pub key: KeySignature,
    /// Correlation of the best candidate (0 when the histogram carries no information)
    pub correlation: f64,
    /// No candidate reached the confidence floor
    pub inconclusive: bool,
    /// Runners-up, best first
    pub alternatives: Vec<KeyCandidate>,
}

/// Duration-weighted pitch-class histogram; chords count every constituent
pub fn pitch_class_histogram(events: &[NoteEvent]) -> [f64; 12] {
    let mut histogram = [0.0; 12];
    for event in events {
        let weight = to_f64(event.duration);
        for pitch in event.pitch.pitches() {
            histogram[pitch.rem_euclid(12) as usize] += weight;
        }
    }
    histogram
}

/// Pearson correlation between a histogram and a profile rotated to `tonic`.
/// `None` when either side has no variance.
pub fn correlate(histogram: &[f64; 12], profile: &[f64; 12], tonic: usize) -> Option<f64> {
    let rotated: Vec<f64> = (0..12).map(|pc| profile[(pc + 12 - tonic) % 12]).collect();
    let mean_h = histogram.iter().sum::<f64>() / 12.0;
    let mean_p = rotated.iter().sum::<f64>() / 12.0;

    let mut covariance = 0.0;
    let mut var_h = 0.0;
    let mut var_p = 0.0;
    for (h, p) in histogram.iter().zip(rotated.iter()) {
        let dh = h - mean_h;
        let dp = p - mean_p;
        covariance += dh * dp;
        var_h += dh * dh;
        var_p += dp * dp;
    }

    if var_h <= f64::EPSILON || var_p <= f64::EPSILON {
        return None;
    }
    Some(covariance / (var_h.sqrt() * var_p.sqrt()))
}

/// Secondary ordering among near-equal correlations
fn tie_rank(c: &KeyCandidate) -> (u8, bool, i16) {
    (c.key.accidental_count(), c.key.mode == Mode::Minor, c.tonic)
}

/// Whether `challenger` should replace `best`
fn outranks(challenger: &KeyCandidate, best: &KeyCandidate) -> bool {
    if (challenger.correlation - best.correlation).abs() > TIE_EPSILON {
        return challenger.correlation > best.correlation;
    }
    tie_rank(challenger) < tie_rank(best)
}

/// All candidates with a defined correlation, best first
pub fn rank_keys(histogram: &[f64; 12]) -> Vec<KeyCandidate> {
    let mut candidates = Vec::with_capacity(24);
    for tonic in 0..12usize {
        for (mode, profile) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
            if let Some(correlation) = correlate(histogram, profile, tonic) {
                candidates.push(KeyCandidate {
                    key: KeySignature::from_tonic(tonic as i16, mode),
                    tonic: tonic as i16,
                    correlation,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.correlation
            .total_cmp(&a.correlation)
            .then_with(|| tie_rank(a).cmp(&tie_rank(b)))
    });
    candidates
}

pub fn detect_key(histogram: &[f64; 12], min_confidence: f64) -> KeyEstimate {
    let ranked = rank_keys(histogram);
    let best = ranked.iter().fold(None::<&KeyCandidate>, |best, c| match best {
        Some(b) if !outranks(c, b) => Some(b),
        _ => Some(c),
    });

    match best {
        Some(best) if best.correlation >= min_confidence => {
            log::debug!("key: {} (r = {:.3})", best.key, best.correlation);
            KeyEstimate {
                key: best.key,
                correlation: best.correlation,
                inconclusive: false,
                alternatives: ranked.iter().filter(|c| *c != best).take(3).copied().collect(),
            }
        }
        other => {
            let correlation = other.map(|c| c.correlation).unwrap_or(0.0);
            log::warn!(
                "key: detection inconclusive (best r = {:.3} < {:.3}), falling back to C major",
                correlation,
                min_confidence
            );
            KeyEstimate {
                key: KeySignature::C_MAJOR,
                correlation,
                inconclusive: true,
                alternatives: ranked.into_iter().take(3).collect(),
            }
        }
    }
}
