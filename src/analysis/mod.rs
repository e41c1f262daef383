//! Key and time-signature detection
//!
//! Both detectors are pure functions over summary tables (a pitch-class
//! histogram, an onset accent table) so they can be exercised without
//! building any notation.

pub mod key;
pub mod meter;

pub use key::{detect_key, pitch_class_histogram, KeyCandidate, KeyEstimate};
pub use meter::{detect_meter, onset_accent_table, MeterEstimate, MeterScore};
