//! Pipeline configuration
//!
//! Every field has a default, so `{}` is a valid configuration. Thresholds
//! left unset follow the grid unit.

use serde::{Deserialize, Serialize};

use crate::cleanup::range::{InstrumentRange, RangePolicy};
use crate::error::{PipelineError, Result};
use crate::models::serde_helpers::{option_quarter_length, quarter_length, serialize_option_as_null};
use crate::models::{QuarterLength, TimeSignature};
use crate::renderers::musicxml::helpers::lcm;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Quantization grid in quarter lengths (1/4 = sixteenth note)
    #[serde(with = "quarter_length")]
    pub grid_unit: QuarterLength,
    /// Subdivisions of the quarter to quantize against instead of the grid
    /// unit, e.g. `[4, 3]`; each value goes to the nearest candidate
    #[serde(serialize_with = "serialize_option_as_null")]
    pub grid_divisors: Option<Vec<i64>>,
    /// Events that arrived shorter than this are dropped as artifacts
    #[serde(with = "option_quarter_length")]
    pub artifact_threshold: Option<QuarterLength>,
    /// Gaps shorter than this are closed by extending the previous note
    #[serde(with = "option_quarter_length")]
    pub legato_threshold: Option<QuarterLength>,
    pub range: InstrumentRange,
    pub range_policy: RangePolicy,
    pub min_key_confidence: f64,
    pub meter_candidates: Vec<TimeSignature>,
    pub meter_margin: f64,
    pub min_meter_onsets: usize,
    #[serde(serialize_with = "serialize_option_as_null")]
    pub title: Option<String>,
    pub part_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid_unit: QuarterLength::new(1, 4),
            grid_divisors: None,
            artifact_threshold: None,
            legato_threshold: None,
            range: InstrumentRange::VIOLIN,
            range_policy: RangePolicy::SingleShift,
            min_key_confidence: 0.5,
            meter_candidates: vec![
                TimeSignature { beats: 4, beat_type: 4 },
                TimeSignature { beats: 3, beat_type: 4 },
                TimeSignature { beats: 6, beat_type: 8 },
                TimeSignature { beats: 2, beat_type: 4 },
            ],
            meter_margin: 0.05,
            min_meter_onsets: 4,
            title: None,
            part_name: "Violin".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| PipelineError::InvalidConfig(format!("cannot parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PipelineError::InvalidConfig(format!("cannot serialize configuration: {}", e)))
    }

    /// Candidate grids for quantization, coarsest first
    pub fn quantize_grids(&self) -> Vec<QuarterLength> {
        match &self.grid_divisors {
            Some(divisors) => {
                let mut divisors: Vec<i64> = divisors.iter().copied().filter(|&d| d > 0).collect();
                divisors.sort_unstable();
                divisors.dedup();
                divisors.into_iter().map(|d| QuarterLength::new(1, d)).collect()
            }
            None => vec![self.grid_unit],
        }
    }

    /// Finest grid every quantized position lies on: the grid unit, or one
    /// over the least common multiple of the divisors
    pub fn analysis_grid(&self) -> QuarterLength {
        match &self.grid_divisors {
            Some(divisors) => {
                let common = divisors.iter().filter(|&&d| d > 0).fold(1, |acc, &d| lcm(acc, d));
                QuarterLength::new(1, common)
            }
            None => self.grid_unit,
        }
    }

    pub fn artifact_threshold(&self) -> QuarterLength {
        self.artifact_threshold.unwrap_or(self.grid_unit)
    }

    pub fn legato_threshold(&self) -> QuarterLength {
        self.legato_threshold.unwrap_or(self.grid_unit)
    }

    pub fn validate(&self) -> Result<()> {
        let zero = QuarterLength::from_integer(0);
        if self.grid_unit <= zero {
            return Err(invalid(format!("grid_unit must be positive, got {}", self.grid_unit)));
        }
        if !is_notatable_grid(self.grid_unit) {
            return Err(invalid(format!(
                "grid_unit {} cannot be written as a plain or triplet note value",
                self.grid_unit
            )));
        }
        if let Some(divisors) = &self.grid_divisors {
            if divisors.is_empty() {
                return Err(invalid("grid_divisors must name at least one subdivision".to_string()));
            }
            if let Some(bad) = divisors.iter().find(|&&d| d <= 0 || !is_notatable_grid(QuarterLength::new(1, d))) {
                return Err(invalid(format!("grid divisor {} is not a plain or triplet subdivision", bad)));
            }
            if !is_notatable_grid(self.analysis_grid()) {
                return Err(invalid(format!(
                    "grid divisors {:?} combine to {}, finer than any note value",
                    divisors,
                    self.analysis_grid()
                )));
            }
        }
        if self.artifact_threshold() <= zero {
            return Err(invalid(format!("artifact_threshold must be positive, got {}", self.artifact_threshold())));
        }
        if self.legato_threshold() <= zero {
            return Err(invalid(format!("legato_threshold must be positive, got {}", self.legato_threshold())));
        }
        self.range.validate().map_err(invalid)?;
        if !self.min_key_confidence.is_finite() || !(-1.0..=1.0).contains(&self.min_key_confidence) {
            return Err(invalid(format!("min_key_confidence must lie in -1..=1, got {}", self.min_key_confidence)));
        }
        if !self.meter_margin.is_finite() || self.meter_margin < 0.0 {
            return Err(invalid(format!("meter_margin must be a non-negative number, got {}", self.meter_margin)));
        }
        if self.meter_candidates.is_empty() {
            return Err(invalid("meter_candidates must name at least one time signature".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PipelineError {
    PipelineError::InvalidConfig(message)
}

/// Grid units must be a power-of-two fraction of a quarter (down to a 64th),
/// optionally in triplets (down to a 64th triplet)
fn is_notatable_grid(grid: QuarterLength) -> bool {
    let mut denom = *grid.denom();
    let mut finest = 16;
    if denom % 3 == 0 {
        denom /= 3;
        finest = 8;
    }
    let numer = *grid.numer();
    (denom as u64).is_power_of_two() && denom <= finest && (numer as u64).is_power_of_two() && numer <= 4
}
