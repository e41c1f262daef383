//! Pipeline orchestration
//!
//! ```text
//! raw events ─ ingest ─ range ─ quantize ─ artifacts ─ monophony ─ legato   (cleanup)
//!                                                                    │
//!                                     key + meter detection ─────────┤      (analysis)
//!                                                                    │
//!                                          spelling ─ assembly ─ Score      (notation)
//!                                                                    │
//!                                          NotationSerializer ─ ArtifactSink
//! ```
//!
//! Every stage is a pure function; the pipeline only threads values through
//! and collects a report. A failure at any stage is returned as a single
//! `PipelineError` and no partial document is produced.

use log::{debug, info, warn};
use serde::Serialize;

use crate::analysis::{detect_key, detect_meter, onset_accent_table, pitch_class_histogram, KeyEstimate, MeterEstimate};
use crate::cleanup::{
    fill_gaps, filter_artifacts, ingest, normalize_range, quantize_nearest, reduce_to_monophony, spell_events, RangeFlag,
};
use crate::config::PipelineConfig;
use crate::converters::read_smf;
use crate::error::Result;
use crate::ir::{assemble, Score};
use crate::models::{KeySignature, NoteEvent, RawNoteEvent, Semitone, TimeSignature};
use crate::renderers::{write_events_smf, NotationSerializer};
use crate::sink::{ArtifactHandle, ArtifactSink};

/// Non-fatal findings worth showing to whoever reads the score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityFlag {
    /// No key reached the confidence floor; C major was used
    KeyDetectionInconclusive { correlation: f64 },
    /// Pitches remain outside the instrument range after transposition
    RangeExceeded { span: Semitone, window: Semitone, folded: usize },
    /// Too little rhythmic material to judge the meter; the default was used
    MeterFallback,
}

/// What each stage did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionReport {
    pub input_events: usize,
    /// Semitones added to every pitch by the range normalizer
    pub transposition: Semitone,
    pub range_flag: Option<RangeFlag>,
    pub artifacts_removed: usize,
    pub polyphony_discarded: usize,
    pub overlaps_truncated: usize,
    pub gaps_closed: usize,
    pub key: KeyEstimate,
    pub meter: MeterEstimate,
    pub flags: Vec<QualityFlag>,
}

/// Cleaned event stream plus its analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cleanup {
    pub events: Vec<NoteEvent>,
    pub report: TranscriptionReport,
}

impl Cleanup {
    pub fn key(&self) -> KeySignature {
        self.report.key.key
    }

    pub fn time(&self) -> TimeSignature {
        self.report.meter.time
    }
}

/// Full result: cleaned events, the assembled score and the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcription {
    pub events: Vec<NoteEvent>,
    pub score: Score,
    pub report: TranscriptionReport,
}

/// A stored artifact and the report of the run that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionArtifact {
    pub handle: ArtifactHandle,
    pub report: TranscriptionReport,
}

/// Configured pipeline; holds no mutable state and can be shared across threads
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stages 1-5 followed by key and meter detection
    pub fn clean(&self, raw: Vec<RawNoteEvent>) -> Result<Cleanup> {
        let config = &self.config;
        let events = ingest(raw)?;
        let input_events = events.len();
        info!("pipeline: {} events in", input_events);

        let range = normalize_range(events, &config.range, config.range_policy);
        debug!("range: shift {} semitones", range.shift);

        let events = quantize_nearest(range.events, &config.quantize_grids())?;

        let filtered = filter_artifacts(events, config.artifact_threshold())?;
        debug!("artifact filter: {} removed", filtered.removed);

        let mono = reduce_to_monophony(filtered.events);
        debug!("monophony: {} discarded, {} truncated", mono.discarded, mono.truncated);

        let legato = fill_gaps(mono.events, config.legato_threshold());
        debug!("legato: {} gaps closed", legato.closed);
        let events = legato.events;

        let key = detect_key(&pitch_class_histogram(&events), config.min_key_confidence);
        let grid = config.analysis_grid();
        let table = onset_accent_table(&events, grid);
        let meter = detect_meter(
            &table,
            grid,
            &config.meter_candidates,
            config.meter_margin,
            config.min_meter_onsets,
        );
        info!(
            "pipeline: {} events out, key {} (r = {:.3}), meter {}",
            events.len(),
            key.key,
            key.correlation,
            meter.time
        );

        let mut flags = Vec::new();
        if let Some(RangeFlag::SpanExceedsRange { span, window, folded }) = &range.flag {
            flags.push(QualityFlag::RangeExceeded { span: *span, window: *window, folded: *folded });
        }
        if key.inconclusive {
            flags.push(QualityFlag::KeyDetectionInconclusive { correlation: key.correlation });
        }
        if meter.fallback {
            flags.push(QualityFlag::MeterFallback);
        }

        Ok(Cleanup {
            events,
            report: TranscriptionReport {
                input_events,
                transposition: range.shift,
                range_flag: range.flag,
                artifacts_removed: filtered.removed,
                polyphony_discarded: mono.discarded,
                overlaps_truncated: mono.truncated,
                gaps_closed: legato.closed,
                key,
                meter,
                flags,
            },
        })
    }

    /// Clean, analyse, spell and assemble
    pub fn run(&self, raw: Vec<RawNoteEvent>) -> Result<Transcription> {
        let cleanup = self.clean(raw)?;
        let key = cleanup.key();
        let spelled = spell_events(&cleanup.events, Some(&key));
        let score = assemble(
            &spelled,
            key,
            cleanup.time(),
            self.config.title.clone(),
            &self.config.part_name,
        )?;
        Ok(Transcription { events: cleanup.events, score, report: cleanup.report })
    }

    /// Run on the notes of a Standard MIDI File
    pub fn run_midi(&self, bytes: &[u8]) -> Result<Transcription> {
        self.run(read_smf(bytes)?)
    }

    /// Run, serialize the score and store it; returns where it went
    pub fn transcribe(
        &self,
        raw: Vec<RawNoteEvent>,
        serializer: &dyn NotationSerializer,
        sink: &dyn ArtifactSink,
        stem: &str,
    ) -> Result<TranscriptionArtifact> {
        let transcription = self.run(raw)?;
        let bytes = serializer.serialize(&transcription.score)?;
        let handle = sink.store(stem, serializer.extension(), serializer.media_type(), &bytes)?;
        if !transcription.report.flags.is_empty() {
            warn!("{}: stored with quality flags {:?}", handle.location, transcription.report.flags);
        }
        info!("pipeline: stored {} ({} bytes)", handle.location, handle.size);
        Ok(TranscriptionArtifact { handle, report: transcription.report })
    }

    /// The cleaned stream as a Standard MIDI File, for audition
    pub fn cleaned_midi(&self, raw: Vec<RawNoteEvent>) -> Result<Vec<u8>> {
        let cleanup = self.clean(raw)?;
        let bytes = write_events_smf(&cleanup.events, cleanup.key(), cleanup.time(), &self.config.part_name)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::RangePolicy;
    use crate::error::{PipelineError, Stage};
    use crate::models::{PitchContent, QuarterLength};
    use crate::renderers::MusicXmlSerializer;
    use crate::sink::MemorySink;

    fn q(n: i64, d: i64) -> QuarterLength {
        QuarterLength::new(n, d)
    }

    fn scenario() -> Vec<RawNoteEvent> {
        vec![
            RawNoteEvent::single(0.0, 1.0, 60),
            RawNoteEvent::single(0.0, 1.0, 64),
            RawNoteEvent::single(1.0, 0.1, 62),
            RawNoteEvent::single(1.3, 1.0, 67),
        ]
    }

    #[test]
    fn test_scenario_events() {
        let cleanup = Pipeline::default().clean(scenario()).unwrap();
        let got: Vec<_> = cleanup.events.iter().map(|e| (e.onset, e.duration, e.representative_pitch())).collect();
        assert_eq!(got, vec![(q(0, 1), q(1, 1), 64), (q(5, 4), q(1, 1), 67)]);
        assert_eq!(cleanup.report.transposition, 0);
        assert_eq!(cleanup.report.artifacts_removed, 1);
        assert_eq!(cleanup.report.polyphony_discarded, 1);
        assert_eq!(cleanup.report.gaps_closed, 0);
        assert!(cleanup.report.range_flag.is_none());
    }

    #[test]
    fn test_run_builds_one_part() {
        let transcription = Pipeline::default().run(scenario()).unwrap();
        assert_eq!(transcription.score.parts.len(), 1);
        let part = &transcription.score.parts[0];
        assert_eq!(part.name, "Violin");
        assert!(part.measures.iter().all(|m| m.validate(part.time.measure_length())));
    }

    #[test]
    fn test_flags_for_wide_span() {
        let raw = vec![RawNoteEvent::single(0.0, 1.0, 40), RawNoteEvent::single(1.0, 1.0, 100)];
        let cleanup = Pipeline::default().clean(raw).unwrap();
        assert!(cleanup
            .report
            .flags
            .iter()
            .any(|f| matches!(f, QualityFlag::RangeExceeded { .. })));
        assert!(cleanup.report.flags.contains(&QualityFlag::MeterFallback));
    }

    #[test]
    fn test_fold_policy_keeps_pitches_in_range() {
        let config = PipelineConfig { range_policy: RangePolicy::FoldOctaves, ..PipelineConfig::default() };
        let raw = vec![RawNoteEvent::single(0.0, 1.0, 40), RawNoteEvent::single(1.0, 1.0, 100)];
        let cleanup = Pipeline::new(config).unwrap().clean(raw).unwrap();
        assert!(cleanup.events.iter().all(|e| (55..=100).contains(&e.representative_pitch())));
    }

    #[test]
    fn test_empty_input_fails_at_ingest() {
        let err = Pipeline::default().run(Vec::new()).unwrap_err();
        assert_eq!(err.stage(), Stage::Ingest);
    }

    #[test]
    fn test_all_artifacts_fails_at_filter() {
        let raw = vec![RawNoteEvent::single(0.0, 0.2, 67), RawNoteEvent::single(1.0, 0.2, 69)];
        let err = Pipeline::default().run(raw).unwrap_err();
        assert_eq!(err.stage(), Stage::ArtifactFilter);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig { meter_candidates: Vec::new(), ..PipelineConfig::default() };
        assert!(matches!(Pipeline::new(config), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_transcribe_stores_artifact() {
        let sink = MemorySink::new();
        let artifact = Pipeline::default()
            .transcribe(scenario(), &MusicXmlSerializer, &sink, "scenario")
            .unwrap();
        assert_eq!(artifact.handle.location, "scenario.musicxml");
        let xml = String::from_utf8(sink.get(&artifact.handle).unwrap()).unwrap();
        assert!(xml.contains("<part-name>Violin</part-name>"));
    }

    #[test]
    fn test_chord_input_keeps_top_note() {
        let raw = vec![RawNoteEvent::chord(0.0, 2.0, &[60, 64, 67]), RawNoteEvent::single(2.0, 2.0, 72)];
        let cleanup = Pipeline::default().clean(raw).unwrap();
        assert_eq!(cleanup.events[0].pitch, PitchContent::Single(67));
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
