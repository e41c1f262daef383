//! Standard MIDI File writer
//!
//! Format 1: track 0 is the conductor (tempo, time and key signature),
//! track 1 holds the melody.

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use super::defaults::{
    tempo_microseconds, DEFAULT_CHANNEL, DEFAULT_PROGRAM, DEFAULT_TEMPO_BPM, DEFAULT_TPQ, DEFAULT_VELOCITY,
};
use crate::ir::{NotationElement, Score};
use crate::models::{KeySignature, Mode, NoteEvent, QuarterLength, TimeSignature};
use crate::renderers::{NotationSerializer, SerializeError};

/// A note in absolute ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiNote {
    pub start_tick: u32,
    pub dur_tick: u32,
    pub pitch: u8,
}

/// What the conductor track announces
#[derive(Debug, Clone)]
pub struct SmfHeader<'a> {
    pub tpq: u16,
    pub key: KeySignature,
    pub time: TimeSignature,
    pub track_name: &'a str,
}

fn to_ticks(length: QuarterLength, tpq: u16) -> Result<u32, SerializeError> {
    let ticks = (length * i64::from(tpq)).round().to_integer();
    u32::try_from(ticks).map_err(|_| SerializeError::Midi(format!("time {} is out of MIDI range", length)))
}

fn to_key(pitch: i16) -> Result<u8, SerializeError> {
    u8::try_from(pitch)
        .ok()
        .filter(|p| *p <= 127)
        .ok_or_else(|| SerializeError::Midi(format!("pitch {} is outside 0..=127", pitch)))
}

/// Write the cleaned, monophonic event list as a Format 1 SMF
pub fn write_events_smf(
    events: &[NoteEvent],
    key: KeySignature,
    time: TimeSignature,
    track_name: &str,
) -> Result<Vec<u8>, SerializeError> {
    let header = SmfHeader { tpq: DEFAULT_TPQ, key, time, track_name };
    let notes = events
        .iter()
        .map(|e| {
            Ok(MidiNote {
                start_tick: to_ticks(e.onset, header.tpq)?,
                dur_tick: to_ticks(e.duration, header.tpq)?,
                pitch: to_key(e.representative_pitch())?,
            })
        })
        .collect::<Result<Vec<_>, SerializeError>>()?;
    write_smf(&notes, &header)
}

/// Collect sounding notes from a score, merging tied pieces
pub fn score_notes(score: &Score, tpq: u16) -> Result<Vec<MidiNote>, SerializeError> {
    let mut notes: Vec<MidiNote> = Vec::new();
    for part in &score.parts {
        let mut cursor = QuarterLength::from_integer(0);
        for measure in &part.measures {
            for element in &measure.elements {
                if let NotationElement::Note(note) = element {
                    let pitch = to_key(note.pitch.midi())?;
                    let start_tick = to_ticks(cursor, tpq)?;
                    let dur_tick = to_ticks(note.duration, tpq)?;
                    let tied = note.tie.map_or(false, |t| t.continues_previous());
                    match notes.last_mut() {
                        Some(last) if tied && last.pitch == pitch => last.dur_tick += dur_tick,
                        _ => notes.push(MidiNote { start_tick, dur_tick, pitch }),
                    }
                }
                cursor += element.duration();
            }
        }
    }
    Ok(notes)
}

/// Write notes to Standard MIDI File (SMF) Format 1
pub fn write_smf(notes: &[MidiNote], header: &SmfHeader<'_>) -> Result<Vec<u8>, SerializeError> {
    let tracks = vec![build_conductor_track(header), build_melody_track(notes, header.track_name)];

    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(header.tpq.into()),
        },
        tracks,
    };

    let mut out = Vec::new();
    smf.write(&mut out)
        .map_err(|e| SerializeError::Midi(format!("Failed to write MIDI: {}", e)))?;
    Ok(out)
}

fn build_conductor_track<'a>(header: &SmfHeader<'_>) -> Track<'a> {
    // Denominator as power of 2 (e.g., 4 -> 2, 8 -> 3)
    let denominator_power = header.time.beat_type.trailing_zeros() as u8;
    let mut events = vec![
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo_microseconds(DEFAULT_TEMPO_BPM).into())),
        },
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
                header.time.beats,
                denominator_power,
                24, // MIDI clocks per metronome click
                8,  // 32nd notes per quarter note
            )),
        },
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::KeySignature(
                header.key.fifths,
                header.key.mode == Mode::Minor,
            )),
        },
    ];
    events.push(end_of_track());
    events
}

fn build_melody_track<'a>(notes: &[MidiNote], name: &'a str) -> Track<'a> {
    let channel = DEFAULT_CHANNEL.into();
    let mut events = vec![
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
        },
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange { program: DEFAULT_PROGRAM.into() },
            },
        },
    ];

    for note in notes {
        events.push(TrackEvent {
            delta: note.start_tick.into(),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key: note.pitch.into(), vel: DEFAULT_VELOCITY.into() },
            },
        });
        events.push(TrackEvent {
            delta: (note.start_tick + note.dur_tick).into(),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key: note.pitch.into(), vel: 0.into() },
            },
        });
    }

    // Stable: a note-off stays ahead of a note-on at the same tick
    events.sort_by_key(|e| e.delta.as_int());
    convert_to_delta_times(&mut events);
    events.push(end_of_track());
    events
}

fn end_of_track<'a>() -> TrackEvent<'a> {
    TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

/// Convert absolute tick times to delta times (time since previous event)
fn convert_to_delta_times(events: &mut [TrackEvent]) {
    let mut prev_tick = 0u32;
    for event in events.iter_mut() {
        let current_tick = event.delta.as_int();
        let delta = current_tick.saturating_sub(prev_tick);
        event.delta = delta.into();
        prev_tick = current_tick;
    }
}

/// Score-to-SMF serializer (ties merged into single notes)
#[derive(Debug, Clone, Copy)]
pub struct MidiSerializer {
    pub tpq: u16,
}

impl Default for MidiSerializer {
    fn default() -> Self {
        Self { tpq: DEFAULT_TPQ }
    }
}

impl NotationSerializer for MidiSerializer {
    fn serialize(&self, score: &Score) -> Result<Vec<u8>, SerializeError> {
        let part = score
            .parts
            .first()
            .ok_or_else(|| SerializeError::InvalidDocument("score has no parts".to_string()))?;
        let notes = score_notes(score, self.tpq)?;
        let header = SmfHeader { tpq: self.tpq, key: part.key, time: part.time, track_name: &part.name };
        write_smf(&notes, &header)
    }

    fn extension(&self) -> &'static str {
        "mid"
    }

    fn media_type(&self) -> &'static str {
        "audio/midi"
    }
}
