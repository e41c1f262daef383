//! Artifact filter: drop events too short to be real notes
//!
//! Audibility is judged on the duration the event arrived with. The
//! quantizer has already floored the working duration to one grid unit, so
//! judging that value would let every blip through.

use crate::error::{PipelineError, Result, Stage};
use crate::models::{NoteEvent, QuarterLength};

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub events: Vec<NoteEvent>,
    pub removed: usize,
}

pub fn filter_artifacts(events: Vec<NoteEvent>, threshold: QuarterLength) -> Result<FilterOutcome> {
    let before = events.len();
    let kept: Vec<NoteEvent> = events.into_iter().filter(|e| e.raw_duration >= threshold).collect();
    let removed = before - kept.len();

    if removed > 0 {
        log::debug!("artifact filter: removed {} events shorter than {}", removed, threshold);
    }
    if kept.is_empty() {
        return Err(PipelineError::EmptyInput { stage: Stage::ArtifactFilter });
    }
    Ok(FilterOutcome { events: kept, removed })
}
