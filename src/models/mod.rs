//! Models module for the note-stream engine
//!
//! This module contains the data models shared by the cleanup stages,
//! the analysis functions and the notation assembler.

pub mod note_event;
pub mod pitch;
pub mod key_signature;
pub mod time_signature;
pub mod serde_helpers;

// Re-export commonly used types
pub use note_event::{NoteEvent, PitchContent, QuarterLength, RawNoteEvent, Semitone};
pub use pitch::{Accidental, SpelledPitch, Step};
pub use key_signature::{KeySignature, Mode};
pub use time_signature::TimeSignature;
