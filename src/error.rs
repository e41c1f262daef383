//! Pipeline error type
//!
//! Every failure names the stage it came from. Subsystem errors (MIDI
//! reading, notation serialization, artifact sinks) keep their own enums and
//! convert through `#[from]`.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::converters::midi_import::MidiError;
use crate::models::QuarterLength;
use crate::renderers::SerializeError;
use crate::sink::SinkError;

/// Pipeline stage a failure is attributed to. Only stages that can fail
/// appear; range, monophony, legato, detection and spelling always succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Config,
    Ingest,
    Quantize,
    ArtifactFilter,
    Assembly,
    Serialization,
    Sink,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Ingest => "ingest",
            Stage::Quantize => "quantize",
            Stage::ArtifactFilter => "artifact-filter",
            Stage::Assembly => "assembly",
            Stage::Serialization => "serialization",
            Stage::Sink => "sink",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed event at index {index}: {reason}")]
    MalformedEvent { index: usize, reason: String },
    #[error("no events left after {stage}")]
    EmptyInput { stage: Stage },
    #[error("grid unit {grid} is too coarse: every duration rounded to zero")]
    QuantizationDegenerate { grid: QuarterLength },
    #[error("measure {measure} cannot be notated: {detail}")]
    AssemblyOverflow { measure: usize, detail: String },
    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializeError),
    #[error("artifact sink failed: {0}")]
    Sink(#[from] SinkError),
    #[error("midi import failed: {0}")]
    MidiImport(#[from] MidiError),
}

impl PipelineError {
    /// Stage the failure is attributed to
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidConfig(_) => Stage::Config,
            PipelineError::MalformedEvent { .. } => Stage::Ingest,
            PipelineError::EmptyInput { stage } => *stage,
            PipelineError::QuantizationDegenerate { .. } => Stage::Quantize,
            PipelineError::AssemblyOverflow { .. } => Stage::Assembly,
            PipelineError::Serialization(_) => Stage::Serialization,
            PipelineError::Sink(_) => Stage::Sink,
            PipelineError::MidiImport(_) => Stage::Ingest,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_name_their_stage() {
        let err = PipelineError::EmptyInput { stage: Stage::ArtifactFilter };
        assert_eq!(err.stage(), Stage::ArtifactFilter);
        assert_eq!(err.to_string(), "no events left after artifact-filter");

        let err = PipelineError::AssemblyOverflow { measure: 3, detail: "sum 5/2".to_string() };
        assert_eq!(err.stage(), Stage::Assembly);
        assert!(err.to_string().contains("measure 3"));
    }

    #[test]
    fn test_stage_labels_match_serialized_names() {
        let stages = [
            Stage::Config,
            Stage::Ingest,
            Stage::Quantize,
            Stage::ArtifactFilter,
            Stage::Assembly,
            Stage::Serialization,
            Stage::Sink,
        ];
        for stage in stages {
            assert_eq!(serde_json::to_string(&stage).unwrap(), format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_degenerate_message_shows_grid() {
        let err = PipelineError::QuantizationDegenerate { grid: QuarterLength::new(4, 1) };
        assert_eq!(err.stage(), Stage::Quantize);
        assert!(err.to_string().contains("grid unit 4"));
    }
}
