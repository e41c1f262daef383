//! Renderers: turning the assembled score (or the cleaned event list) into
//! bytes in an interchange format.
//!
//! Serializers are plugged into the pipeline through `NotationSerializer`.

use thiserror::Error;

use crate::ir::Score;

pub mod musicxml;
pub mod midi;

pub use musicxml::{emit_musicxml, MusicXmlSerializer};
pub use midi::{write_events_smf, MidiSerializer};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("document cannot be serialized: {0}")]
    InvalidDocument(String),
    #[error("MIDI encoding failed: {0}")]
    Midi(String),
}

/// Turns a `Score` into the bytes of one artifact
pub trait NotationSerializer: Send + Sync {
    fn serialize(&self, score: &Score) -> Result<Vec<u8>, SerializeError>;

    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn media_type(&self) -> &'static str {
        "application/octet-stream"
    }
}
