//! MusicXML export module
//!
//! Provides MusicXML 3.1 partwise export for an assembled `Score`.
//!
//! # Module Structure
//!
//! - **builder**: MusicXML XML structure building
//! - **emitter**: walks the document tree; `MusicXmlSerializer`
//! - **helpers**: divisions (GCD/LCM)

pub mod builder;
pub mod emitter;
pub mod helpers;

pub use builder::{xml_escape, MusicXmlBuilder};
pub use emitter::{emit_musicxml, MusicXmlSerializer};
