//! Cleanup stages
//!
//! Each stage is a pure function over an onset-sorted `Vec<NoteEvent>`:
//!
//! ```text
//! RawNoteEvent[] → ingest → range → quantize → artifact → monophony → legato
//!                                                                     ↓
//!                                              enharmonic (after key detection)
//! ```

pub mod range;
pub mod quantize;
pub mod artifact;
pub mod monophony;
pub mod legato;
pub mod enharmonic;

pub use range::{normalize_range, InstrumentRange, RangeFlag, RangeOutcome, RangePolicy};
pub use quantize::{quantize, quantize_nearest};
pub use artifact::{filter_artifacts, FilterOutcome};
pub use monophony::{reduce_to_monophony, MonophonyOutcome};
pub use legato::{fill_gaps, LegatoOutcome};
pub use enharmonic::{spell_events, spell_pitch, SpelledEvent};

use crate::error::{PipelineError, Result, Stage};
use crate::models::{NoteEvent, RawNoteEvent};

/// Validate raw events and turn them into working events sorted by onset.
///
/// The sort is stable, so events sharing an onset keep the caller's order.
pub fn ingest(raw: Vec<RawNoteEvent>) -> Result<Vec<NoteEvent>> {
    for (index, event) in raw.iter().enumerate() {
        event
            .check()
            .map_err(|reason| PipelineError::MalformedEvent { index, reason })?;
    }
    if raw.is_empty() {
        return Err(PipelineError::EmptyInput { stage: Stage::Ingest });
    }

    let mut events: Vec<NoteEvent> = raw.into_iter().map(NoteEvent::from).collect();
    events.sort_by(|a, b| a.onset.cmp(&b.onset));
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuarterLength;

    #[test]
    fn test_ingest_sorts_stably() {
        let events = ingest(vec![
            RawNoteEvent::single(1.0, 1.0, 62),
            RawNoteEvent::single(0.0, 1.0, 60),
            RawNoteEvent::single(1.0, 1.0, 64),
        ])
        .unwrap();
        let order: Vec<_> = events.iter().map(|e| e.representative_pitch()).collect();
        assert_eq!(order, vec![60, 62, 64]);
        assert_eq!(events[0].onset, QuarterLength::from_integer(0));
    }

    #[test]
    fn test_ingest_names_bad_index() {
        let err = ingest(vec![
            RawNoteEvent::single(0.0, 1.0, 60),
            RawNoteEvent::single(1.0, -1.0, 60),
        ])
        .unwrap_err();
        match err {
            PipelineError::MalformedEvent { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_ingest_rejects_events_past_the_time_limit() {
        let err = ingest(vec![
            RawNoteEvent::single(0.0, 1.0, 60),
            RawNoteEvent::single(3e18, 1.0, 60),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedEvent { index: 1, .. }));
        assert_eq!(err.stage(), Stage::Ingest);
    }

    #[test]
    fn test_ingest_empty() {
        let err = ingest(Vec::new()).unwrap_err();
        assert_eq!(err.stage(), Stage::Ingest);
    }
}
