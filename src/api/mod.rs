//! Sheet generation WASM API
//!
//! The JavaScript-facing surface of the crate.
//!
//! # Module Structure
//!
//! - `helpers`: serialization at the JS boundary, error conversion and logging
//! - `transcribe`: pipeline entry points (`transcribeEvents`, `transcribeMidi`,
//!   `cleanupEvents`, `exportCleanedMidi`) and the default configuration
//!
//! Every JS entry point has a native twin taking and returning JSON strings or
//! bytes, re-exported here.

pub mod helpers;
pub mod transcribe;

pub use transcribe::{
    cleanup_events, cleanup_events_json, export_cleaned_midi_bytes, export_cleaned_midi_json, get_default_config,
    get_default_config_json, set_default_config, set_default_config_json, transcribe_events, transcribe_events_json,
    transcribe_midi_bytes, transcribe_midi_json, TranscriptionOutput,
};
