// MIDI in and out of the pipeline
//
// The cleaned stream exported as MIDI must read back as the same events,
// and a score written as MIDI must survive another trip through the pipeline.

use midly::{Format, Fps, Header, MetaMessage, Smf, Timing, TrackEvent, TrackEventKind};
use sheetgen_wasm::converters::{read_smf, MidiError};
use sheetgen_wasm::models::{NoteEvent, PitchContent, QuarterLength, RawNoteEvent};
use sheetgen_wasm::{MidiSerializer, NotationSerializer, Pipeline, PipelineError, Stage};

fn triples(events: &[NoteEvent]) -> Vec<(QuarterLength, QuarterLength, PitchContent)> {
    events.iter().map(|e| (e.onset, e.duration, e.pitch.clone())).collect()
}

fn raw_triples(events: &[RawNoteEvent]) -> Vec<(QuarterLength, QuarterLength, PitchContent)> {
    events.iter().map(|e| (e.onset, e.duration, e.pitch.clone())).collect()
}

fn phrase() -> Vec<RawNoteEvent> {
    vec![
        RawNoteEvent::single(0.02, 0.98, 62),
        RawNoteEvent::single(1.0, 0.45, 66),
        RawNoteEvent::single(1.52, 0.5, 69),
        RawNoteEvent::single(2.0, 0.08, 70),
        RawNoteEvent::single(2.1, 1.9, 74),
        RawNoteEvent::single(4.0, 1.0, 73),
        RawNoteEvent::single(5.0, 1.0, 71),
        RawNoteEvent::single(6.0, 2.0, 69),
    ]
}

#[test]
fn test_cleaned_midi_reads_back_unchanged() {
    let pipeline = Pipeline::default();
    let cleanup = pipeline.clean(phrase()).unwrap();
    let bytes = pipeline.cleaned_midi(phrase()).unwrap();

    let read = read_smf(&bytes).unwrap();
    assert_eq!(raw_triples(&read), triples(&cleanup.events));
}

#[test]
fn test_score_midi_transcribes_to_same_events() {
    let pipeline = Pipeline::default();
    let first = pipeline.run(phrase()).unwrap();
    let bytes = MidiSerializer::default().serialize(&first.score).unwrap();

    let second = pipeline.run_midi(&bytes).unwrap();
    assert_eq!(triples(&second.events), triples(&first.events));
    assert_eq!(second.score.parts[0].key, first.score.parts[0].key);
}

#[test]
fn test_cleaned_midi_header() {
    let bytes = Pipeline::default().cleaned_midi(phrase()).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(smf.header.format, Format::Parallel);
    assert!(matches!(smf.header.timing, Timing::Metrical(tpq) if tpq.as_int() == 480));
    assert_eq!(smf.tracks.len(), 2);
    let has_tempo = smf.tracks[0]
        .iter()
        .any(|e| matches!(e.kind, TrackEventKind::Meta(MetaMessage::Tempo(_))));
    assert!(has_tempo);
}

#[test]
fn test_timecode_files_rejected() {
    let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Timecode(Fps::Fps25, 40)));
    smf.tracks.push(vec![TrackEvent { delta: 0u32.into(), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) }]);
    let mut bytes = Vec::new();
    smf.write(&mut bytes).unwrap();

    assert!(matches!(read_smf(&bytes), Err(MidiError::UnsupportedTiming(_))));
    let err = Pipeline::default().run_midi(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::MidiImport(_)));
    assert_eq!(err.stage(), Stage::Ingest);
}

#[test]
fn test_garbage_bytes_rejected() {
    assert!(matches!(read_smf(b"RIFF not a midi file"), Err(MidiError::Parse(_))));
}
