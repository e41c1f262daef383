//! MIDI export
//!
//! Two entry points share one SMF writer:
//! - `write_events_smf`: the cleaned event list, for auditioning the cleanup
//! - `MidiSerializer`: an assembled `Score`, tied pieces merged back into notes
//!
//! # Usage
//! ```rust,ignore
//! use crate::renderers::midi::write_events_smf;
//!
//! let bytes = write_events_smf(&transcription.events, key, time, "Violin")?;
//! ```

pub mod defaults;
pub mod writer;

pub use defaults::{DEFAULT_PROGRAM, DEFAULT_TEMPO_BPM, DEFAULT_TPQ, DEFAULT_VELOCITY};
pub use writer::{score_notes, write_events_smf, write_smf, MidiNote, MidiSerializer, SmfHeader};
