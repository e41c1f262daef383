//! Notation document and its assembly
//!
//! The document is a format-agnostic tree that serializers walk:
//!
//! ```text
//! SpelledEvent[] (monophonic, quantized)
//!     ↓
//! measurization (timeline, barlines, padding)
//!     ↓
//! builder (beat splits, note values, ties, tuplets, beams, accidentals)
//!     ↓
//! Score → NotationSerializer (MusicXML, ...)
//! ```
//!
//! # Modules
//!
//! - **types**: the document tree (`Score`, `Part`, `Measure`, `NotationElement`)
//! - **duration**: note values and decomposition of lengths into them
//! - **measurization**: slicing a timeline into full bars
//! - **builder**: `assemble`, the entry point
//! - **clef**: clef choice from pitch content

pub mod types;
pub mod duration;
pub mod measurization;
pub mod builder;
pub mod clef;

pub use types::{
    BeamState,
    Clef,
    Measure,
    NotatedNote,
    NotatedRest,
    NotationElement,
    Part,
    Score,
    TieType,
    TupletInfo,
};

pub use duration::{decompose, NoteType, NoteValue};
pub use builder::assemble;
