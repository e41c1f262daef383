//! Format converters
//!
//! Inputs in interchange formats turned into the pipeline's raw note events.

pub mod midi_import;

pub use midi_import::{read_smf, MidiError};
