//! Sheet generation WASM Module
//!
//! Turns the note events produced by a pitch-inference model into a
//! single-part score. The events are cleaned up (range, quantization,
//! artifacts, monophony, legato), analysed for key and meter, spelled and
//! assembled into measures, then serialized as MusicXML or MIDI.
//!
//! Native callers use [`Pipeline`]; browser callers use the `api` module.

pub mod models;
pub mod error;
pub mod config;
pub mod cleanup;
pub mod analysis;
pub mod ir;
pub mod renderers;
pub mod converters;
pub mod sink;
pub mod inference;
pub mod pipeline;
pub mod api;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{PipelineError, Result, Stage};
pub use models::{KeySignature, NoteEvent, PitchContent, QuarterLength, RawNoteEvent, TimeSignature};
pub use pipeline::{Cleanup, Pipeline, QualityFlag, Transcription, TranscriptionArtifact, TranscriptionReport};
pub use renderers::{MidiSerializer, MusicXmlSerializer, NotationSerializer};
pub use sink::{ArtifactHandle, ArtifactSink, DirectorySink, MemorySink};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // A logger may already be installed by the host page
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Debug);

    log::info!("Sheet generation WASM module initialized");
}
