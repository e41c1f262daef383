//! Inference collaborator
//!
//! The audio-to-pitch model lives outside this crate. It is reached through
//! `NoteEventSource`; `InferenceSlot` holds one loaded instance and lets a
//! single caller use it at a time, for model runtimes that are not safe to
//! call concurrently.

use std::sync::Mutex;

use thiserror::Error;

use crate::models::RawNoteEvent;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference failed: {0}")]
    Failed(String),
    #[error("inference slot lock poisoned")]
    Poisoned,
}

/// Produces raw note events for one audio input
pub trait NoteEventSource {
    type Input: ?Sized;

    fn infer(&mut self, input: &Self::Input) -> Result<Vec<RawNoteEvent>, InferenceError>;
}

/// One loaded model behind a lock
#[derive(Debug)]
pub struct InferenceSlot<S> {
    source: Mutex<S>,
}

impl<S: NoteEventSource> InferenceSlot<S> {
    pub fn new(source: S) -> Self {
        Self { source: Mutex::new(source) }
    }

    /// Run inference, waiting for the slot if another caller holds it
    pub fn infer(&self, input: &S::Input) -> Result<Vec<RawNoteEvent>, InferenceError> {
        let mut source = self.source.lock().map_err(|_| InferenceError::Poisoned)?;
        source.infer(input)
    }

    pub fn into_inner(self) -> Result<S, InferenceError> {
        self.source.into_inner().map_err(|_| InferenceError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Stand-in model: one quarter note per byte, pitch = byte value
    struct CountingModel {
        calls: usize,
    }

    impl NoteEventSource for CountingModel {
        type Input = [u8];

        fn infer(&mut self, input: &[u8]) -> Result<Vec<RawNoteEvent>, InferenceError> {
            self.calls += 1;
            if input.is_empty() {
                return Err(InferenceError::Failed("no audio".to_string()));
            }
            Ok(input
                .iter()
                .enumerate()
                .map(|(i, b)| RawNoteEvent::single(i as f64, 1.0, i16::from(*b)))
                .collect())
        }
    }

    #[test]
    fn test_slot_serializes_callers() {
        let slot = Arc::new(InferenceSlot::new(CountingModel { calls: 0 }));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || slot.infer(&[60, 62, 64]).unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        let model = Arc::try_unwrap(slot).ok().unwrap().into_inner().unwrap();
        assert_eq!(model.calls, 4);
    }

    #[test]
    fn test_model_errors_pass_through() {
        let slot = InferenceSlot::new(CountingModel { calls: 0 });
        assert!(matches!(slot.infer(&[]), Err(InferenceError::Failed(_))));
    }
}
