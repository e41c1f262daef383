//! Grid quantization
//!
//! Onsets and durations snap to the nearest multiple of the grid unit.
//! Exact halves round away from zero. With several candidate grids each
//! value goes to whichever grid lands closest, the coarser grid winning ties.

use crate::error::{PipelineError, Result};
use crate::models::{NoteEvent, QuarterLength};

/// Nearest multiple of `grid` to `value`
pub fn snap(value: QuarterLength, grid: QuarterLength) -> QuarterLength {
    (value / grid).round() * grid
}

/// Nearest snap of `value` across `grids`, which run coarsest first.
/// Ties keep the earlier, coarser grid.
pub fn snap_nearest(value: QuarterLength, grids: &[QuarterLength]) -> QuarterLength {
    let mut best: Option<(QuarterLength, QuarterLength)> = None;
    for &grid in grids {
        let candidate = snap(value, grid);
        let error = if candidate > value { candidate - value } else { value - candidate };
        match best {
            Some((_, best_error)) if best_error <= error => {}
            _ => best = Some((candidate, error)),
        }
    }
    best.map(|(candidate, _)| candidate).unwrap_or(value)
}

/// Snap every event to the grid. A duration that rounds to zero becomes one
/// grid unit; if that happens to every event the grid is too coarse for the
/// input and the stage fails.
pub fn quantize(events: Vec<NoteEvent>, grid: QuarterLength) -> Result<Vec<NoteEvent>> {
    quantize_nearest(events, &[grid])
}

/// [`quantize`] over several candidate grids, coarsest first. Durations that
/// round to zero on every grid take the finest grid unit.
pub fn quantize_nearest(events: Vec<NoteEvent>, grids: &[QuarterLength]) -> Result<Vec<NoteEvent>> {
    let zero = QuarterLength::from_integer(0);
    let finest = match grids.iter().min() {
        Some(&grid) => grid,
        None => return Ok(events),
    };
    let total = events.len();
    let mut floored = 0usize;

    let quantized: Vec<NoteEvent> = events
        .into_iter()
        .map(|mut e| {
            e.onset = snap_nearest(e.onset, grids);
            let duration = snap_nearest(e.duration, grids);
            e.duration = if duration == zero {
                floored += 1;
                finest
            } else {
                duration
            };
            e
        })
        .collect();

    if total > 0 && floored == total {
        return Err(PipelineError::QuantizationDegenerate { grid: finest });
    }
    if floored > 0 {
        log::debug!("quantize: {} of {} durations floored to the grid unit {}", floored, total, finest);
    }
    Ok(quantized)
}
