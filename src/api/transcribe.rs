//! Transcription API
//!
//! Each JS entry point is a thin wrapper over a native function so the whole
//! surface can be exercised without a browser. Native functions report
//! failures as strings prefixed with the failing stage.

use std::sync::Mutex;

use lazy_static::lazy_static;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::helpers::{deserialize, deserialize_optional, js_error, pipeline_error_message, serialize};
use crate::config::PipelineConfig;
use crate::converters::read_smf;
use crate::models::RawNoteEvent;
use crate::pipeline::{Cleanup, Pipeline, TranscriptionReport};
use crate::renderers::{MusicXmlSerializer, NotationSerializer};
use crate::{wasm_error, wasm_info, wasm_log, wasm_warn};

// Configuration used when a call does not pass its own
lazy_static! {
    static ref DEFAULT_CONFIG: Mutex<PipelineConfig> = Mutex::new(PipelineConfig::default());
}

/// Result of a transcription as seen by JS callers
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionOutput {
    pub musicxml: String,
    pub report: TranscriptionReport,
}

// ============================================================================
// Configuration
// ============================================================================

fn default_config() -> Result<PipelineConfig, String> {
    DEFAULT_CONFIG
        .lock()
        .map(|config| config.clone())
        .map_err(|_| "default configuration lock poisoned".to_string())
}

fn pipeline_for(config: Option<PipelineConfig>) -> Result<Pipeline, String> {
    let config = match config {
        Some(config) => config,
        None => default_config()?,
    };
    Pipeline::new(config).map_err(|e| pipeline_error_message(&e))
}

fn parse_config(config_json: Option<&str>) -> Result<Option<PipelineConfig>, String> {
    config_json
        .map(|json| PipelineConfig::from_json(json).map_err(|e| pipeline_error_message(&e)))
        .transpose()
}

fn parse_events(events_json: &str) -> Result<Vec<RawNoteEvent>, String> {
    serde_json::from_str(events_json).map_err(|e| format!("[ingest] cannot parse events: {}", e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("[serialization] {}", e))
}

/// Replace the default configuration after validating it
pub fn set_default_config(config: PipelineConfig) -> Result<(), String> {
    config.validate().map_err(|e| pipeline_error_message(&e))?;
    let mut current = DEFAULT_CONFIG
        .lock()
        .map_err(|_| "default configuration lock poisoned".to_string())?;
    *current = config;
    Ok(())
}

pub fn get_default_config() -> Result<PipelineConfig, String> {
    default_config()
}

pub fn set_default_config_json(config_json: &str) -> Result<(), String> {
    let config = PipelineConfig::from_json(config_json).map_err(|e| pipeline_error_message(&e))?;
    set_default_config(config)
}

pub fn get_default_config_json() -> Result<String, String> {
    to_json(&default_config()?)
}

// ============================================================================
// Native operations
// ============================================================================

/// Run the pipeline and serialize the score as MusicXML
pub fn transcribe_events(
    raw: Vec<RawNoteEvent>,
    config: Option<PipelineConfig>,
) -> Result<TranscriptionOutput, String> {
    let pipeline = pipeline_for(config)?;
    let transcription = pipeline.run(raw).map_err(|e| pipeline_error_message(&e))?;
    let bytes = MusicXmlSerializer
        .serialize(&transcription.score)
        .map_err(|e| format!("[serialization] {}", e))?;
    let musicxml = String::from_utf8(bytes).map_err(|e| format!("[serialization] {}", e))?;
    Ok(TranscriptionOutput { musicxml, report: transcription.report })
}

/// Same as [`transcribe_events`] on the notes of a Standard MIDI File
pub fn transcribe_midi_bytes(bytes: &[u8], config: Option<PipelineConfig>) -> Result<TranscriptionOutput, String> {
    let raw = read_smf(bytes).map_err(|e| format!("[ingest] {}", e))?;
    transcribe_events(raw, config)
}

/// Cleanup and analysis only, no score
pub fn cleanup_events(raw: Vec<RawNoteEvent>, config: Option<PipelineConfig>) -> Result<Cleanup, String> {
    pipeline_for(config)?.clean(raw).map_err(|e| pipeline_error_message(&e))
}

/// Read a Standard MIDI File, clean its notes and write them back out
pub fn export_cleaned_midi_bytes(bytes: &[u8], config: Option<PipelineConfig>) -> Result<Vec<u8>, String> {
    let raw = read_smf(bytes).map_err(|e| format!("[ingest] {}", e))?;
    pipeline_for(config)?
        .cleaned_midi(raw)
        .map_err(|e| pipeline_error_message(&e))
}

pub fn transcribe_events_json(events_json: &str, config_json: Option<&str>) -> Result<String, String> {
    let output = transcribe_events(parse_events(events_json)?, parse_config(config_json)?)?;
    to_json(&output)
}

pub fn transcribe_midi_json(bytes: &[u8], config_json: Option<&str>) -> Result<String, String> {
    let output = transcribe_midi_bytes(bytes, parse_config(config_json)?)?;
    to_json(&output)
}

pub fn cleanup_events_json(events_json: &str, config_json: Option<&str>) -> Result<String, String> {
    let cleanup = cleanup_events(parse_events(events_json)?, parse_config(config_json)?)?;
    to_json(&cleanup)
}

pub fn export_cleaned_midi_json(bytes: &[u8], config_json: Option<&str>) -> Result<Vec<u8>, String> {
    export_cleaned_midi_bytes(bytes, parse_config(config_json)?)
}

/// Warn on the console once per quality flag, returning the messages
fn warn_quality_flags(operation: &str, report: &TranscriptionReport) -> Vec<String> {
    report
        .flags
        .iter()
        .map(|flag| {
            let message = format!(
                "{}: quality flag {}",
                operation,
                serde_json::to_string(flag).unwrap_or_else(|_| format!("{:?}", flag))
            );
            wasm_warn!("{}", message);
            message
        })
        .collect()
}

// ============================================================================
// JS entry points
// ============================================================================

/// Transcribe inferred note events
///
/// `events` is an array of `{ onset, duration, pitch }`; `config` is an
/// optional `PipelineConfig` object. Returns `{ musicxml, report }`.
#[wasm_bindgen(js_name = transcribeEvents)]
pub fn transcribe_events_js(events: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
    let raw: Vec<RawNoteEvent> = deserialize(events, "Events deserialization error")?;
    let config: Option<PipelineConfig> = deserialize_optional(config, "Config deserialization error")?;
    wasm_log!("transcribeEvents: {} events", raw.len());

    let output = transcribe_events(raw, config).map_err(js_error)?;
    wasm_info!("transcribeEvents: {} bytes of MusicXML", output.musicxml.len());
    warn_quality_flags("transcribeEvents", &output.report);
    serialize(&output, "Transcription serialization error")
}

/// Transcribe the notes of a Standard MIDI File
#[wasm_bindgen(js_name = transcribeMidi)]
pub fn transcribe_midi_js(bytes: &[u8], config: JsValue) -> Result<JsValue, JsValue> {
    let config: Option<PipelineConfig> = deserialize_optional(config, "Config deserialization error")?;
    wasm_log!("transcribeMidi: {} bytes", bytes.len());

    let output = transcribe_midi_bytes(bytes, config).map_err(js_error)?;
    warn_quality_flags("transcribeMidi", &output.report);
    serialize(&output, "Transcription serialization error")
}

/// Clean inferred note events; returns `{ events, report }`
#[wasm_bindgen(js_name = cleanupEvents)]
pub fn cleanup_events_js(events: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
    let raw: Vec<RawNoteEvent> = deserialize(events, "Events deserialization error")?;
    let config: Option<PipelineConfig> = deserialize_optional(config, "Config deserialization error")?;

    let cleanup = cleanup_events(raw, config).map_err(js_error)?;
    serialize(&cleanup, "Cleanup serialization error")
}

/// Clean the notes of a Standard MIDI File and return a new one
#[wasm_bindgen(js_name = exportCleanedMidi)]
pub fn export_cleaned_midi_js(bytes: &[u8], config: JsValue) -> Result<Vec<u8>, JsValue> {
    let config: Option<PipelineConfig> = deserialize_optional(config, "Config deserialization error")?;
    let out = export_cleaned_midi_bytes(bytes, config).map_err(js_error)?;
    wasm_info!("exportCleanedMidi: {} bytes in, {} bytes out", bytes.len(), out.len());
    Ok(out)
}

#[wasm_bindgen(js_name = setDefaultConfig)]
pub fn set_default_config_js(config: JsValue) -> Result<(), JsValue> {
    let config: PipelineConfig = deserialize(config, "Config deserialization error")?;
    set_default_config(config).map_err(|e| {
        wasm_error!("setDefaultConfig rejected: {}", e);
        JsValue::from_str(&e)
    })
}

#[wasm_bindgen(js_name = getDefaultConfig)]
pub fn get_default_config_js() -> Result<JsValue, JsValue> {
    let config = get_default_config().map_err(js_error)?;
    serialize(&config, "Config serialization error")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r#"[
        {"onset": 0, "duration": 1, "pitch": 60},
        {"onset": 0, "duration": 1, "pitch": 64},
        {"onset": 1, "duration": 0.1, "pitch": 62},
        {"onset": 1.3, "duration": 1, "pitch": 67}
    ]"#;

    #[test]
    fn test_transcribe_json_output_shape() {
        let json = transcribe_events_json(EVENTS, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["musicxml"].as_str().unwrap().contains("<score-partwise"));
        assert_eq!(value["report"]["artifacts_removed"], 1);
        assert_eq!(value["report"]["polyphony_discarded"], 1);
    }

    #[test]
    fn test_cleanup_json_uses_rational_strings() {
        let json = cleanup_events_json(EVENTS, Some(r#"{"title": "Etude"}"#)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["events"][1]["onset"], "5/4");
    }

    #[test]
    fn test_quality_flags_become_warnings() {
        let wide = r#"[
            {"onset": 0, "duration": 1, "pitch": 30},
            {"onset": 1, "duration": 1, "pitch": 60},
            {"onset": 2, "duration": 1, "pitch": 100}
        ]"#;
        let output = transcribe_events(parse_events(wide).unwrap(), None).unwrap();
        let warnings = warn_quality_flags("transcribeEvents", &output.report);
        assert_eq!(warnings.len(), output.report.flags.len());
        assert!(warnings.iter().any(|w| w.contains("\"kind\":\"range_exceeded\"")), "{:?}", warnings);

        let clean = transcribe_events(parse_events(EVENTS).unwrap(), None).unwrap();
        let expected = clean.report.flags.len();
        assert_eq!(warn_quality_flags("transcribeEvents", &clean.report).len(), expected);
    }

    #[test]
    fn test_errors_name_the_stage() {
        let err = transcribe_events_json("[]", None).unwrap_err();
        assert!(err.starts_with("[ingest]"), "{}", err);

        let err = transcribe_events_json(EVENTS, Some(r#"{"grid_unit": "0"}"#)).unwrap_err();
        assert!(err.starts_with("[config]"), "{}", err);
    }

    #[test]
    fn test_malformed_midi_rejected() {
        let err = export_cleaned_midi_bytes(b"not midi", None).unwrap_err();
        assert!(err.starts_with("[ingest]"), "{}", err);
    }
}
