//! Standard MIDI File to raw note events
//!
//! The inference model hands over an SMF. Notes are paired per channel and
//! key, first in first out; a NoteOn with velocity 0 is a NoteOff. A note
//! still sounding when its track ends is closed at the track's last event.

use std::collections::HashMap;

use log::{debug, warn};
use midly::{MidiMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;

use crate::models::{PitchContent, QuarterLength, RawNoteEvent, Semitone};

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("cannot parse MIDI file: {0}")]
    Parse(String),
    #[error("unsupported MIDI timing: {0}")]
    UnsupportedTiming(String),
}

pub type Result<T> = std::result::Result<T, MidiError>;

/// Read every note of every track, in quarter-note time
pub fn read_smf(bytes: &[u8]) -> Result<Vec<RawNoteEvent>> {
    let smf = Smf::parse(bytes).map_err(|e| MidiError::Parse(e.to_string()))?;

    let tpq = match smf.header.timing {
        Timing::Metrical(tp) if tp.as_int() > 0 => i64::from(tp.as_int()),
        Timing::Metrical(_) => return Err(MidiError::UnsupportedTiming("zero ticks per quarter".to_string())),
        Timing::Timecode(fps, subframes) => {
            return Err(MidiError::UnsupportedTiming(format!(
                "SMPTE timecode ({} fps, {} subframes)",
                fps.as_f32(),
                subframes
            )))
        }
    };

    let mut events = Vec::new();
    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut tick = 0u64;
        let mut sounding: HashMap<(u8, u8), Vec<u64>> = HashMap::new();

        for event in track {
            tick += u64::from(event.delta.as_int());
            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    sounding.entry((channel, key.as_int())).or_default().push(tick);
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    let starts = sounding.entry((channel, key.as_int())).or_default();
                    if starts.is_empty() {
                        debug!("track {}: note-off for key {} with no note sounding", track_index, key.as_int());
                        continue;
                    }
                    let start = starts.remove(0);
                    push_note(&mut events, start, tick, key.as_int(), tpq);
                }
                _ => {}
            }
        }

        let mut unterminated: Vec<(u64, u8)> = sounding
            .into_iter()
            .flat_map(|((_, key), starts)| starts.into_iter().map(move |s| (s, key)))
            .collect();
        if !unterminated.is_empty() {
            warn!(
                "track {}: {} notes never released, closing them at tick {}",
                track_index,
                unterminated.len(),
                tick
            );
        }
        unterminated.sort_unstable();
        for (start, key) in unterminated {
            push_note(&mut events, start, tick, key, tpq);
        }
    }

    events.sort_by(|a: &RawNoteEvent, b: &RawNoteEvent| a.onset.cmp(&b.onset));
    debug!("read {} notes from {} tracks at {} ticks per quarter", events.len(), smf.tracks.len(), tpq);
    Ok(events)
}

fn push_note(events: &mut Vec<RawNoteEvent>, start: u64, end: u64, key: u8, tpq: i64) {
    if end <= start {
        debug!("dropping zero-length note {} at tick {}", key, start);
        return;
    }
    events.push(RawNoteEvent::new(
        QuarterLength::new(start as i64, tpq),
        QuarterLength::new((end - start) as i64, tpq),
        PitchContent::Single(Semitone::from(key)),
    ));
}
