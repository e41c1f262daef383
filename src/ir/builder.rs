//! Notation assembly: spelled events to a `Score`
//!
//! Per bar the builder:
//!
//! 1. splits pieces that start off the beat at the next beat boundary,
//! 2. decomposes every piece into notatable values (pieces of one note tied),
//!    writing the stretch from a triplet offset back to the binary grid in
//!    triplet values so every bracket closes a whole 3:2 group,
//! 3. marks tuplet brackets over runs of triplet values,
//! 4. beams flagged notes that share a beat,
//! 5. decides which accidentals to print from the running measure state.
//!
//! A bar that cannot be written, or whose values do not fill the measure
//! exactly, is an `AssemblyOverflow`.

use std::collections::HashMap;

use log::debug;

use super::clef::guess_clef;
use super::duration::{decompose, decompose_triplets, NoteValue};
use super::measurization::{measurize, Bar, BarPiece, SegmentContent};
use super::types::{BeamState, Measure, NotationElement, Part, Score, TieType};
use crate::cleanup::SpelledEvent;
use crate::error::{PipelineError, Result};
use crate::models::{Accidental, KeySignature, QuarterLength, Step, TimeSignature};

/// Part identifier used for the single part
pub const PART_ID: &str = "P1";

/// An element with its offset from the start of the measure
#[derive(Debug, Clone)]
struct Placed {
    offset: QuarterLength,
    element: NotationElement,
}

impl Placed {
    fn end(&self) -> QuarterLength {
        self.offset + self.element.duration()
    }
}

/// Build the single-part score for a monophonic, spelled line
pub fn assemble(
    events: &[SpelledEvent],
    key: KeySignature,
    time: TimeSignature,
    title: Option<String>,
    part_name: &str,
) -> Result<Score> {
    let capacity = time.measure_length();
    let bars = measurize(events, capacity)?;

    let mut measures = Vec::with_capacity(bars.len());
    for bar in &bars {
        measures.push(build_measure(bar, &key, &time)?);
    }

    debug!(
        "assembled {} measures in {} / {} from {} events",
        measures.len(),
        time,
        key,
        events.len()
    );

    Ok(Score {
        title,
        parts: vec![Part {
            id: PART_ID.to_string(),
            name: part_name.to_string(),
            clef: guess_clef(events),
            key,
            time,
            measures,
        }],
    })
}

fn build_measure(bar: &Bar, key: &KeySignature, time: &TimeSignature) -> Result<Measure> {
    let beat = time.beat_length();
    let mut placed = Vec::new();

    for piece in &bar.pieces {
        notate_piece(piece, beat, &mut placed).map_err(|detail| overflow(bar.number, detail))?;
    }

    mark_tuplets(&mut placed);
    mark_beams(&mut placed, beat);
    mark_accidentals(&mut placed, key);

    let measure = Measure {
        number: bar.number,
        elements: placed.into_iter().map(|p| p.element).collect(),
    };

    let capacity = time.measure_length();
    if !measure.validate(capacity) {
        return Err(overflow(
            bar.number,
            format!("values add up to {} but the measure holds {}", measure.duration(), capacity),
        ));
    }
    Ok(measure)
}

fn overflow(measure: usize, detail: String) -> PipelineError {
    PipelineError::AssemblyOverflow { measure, detail }
}

/// Split a piece that starts off the beat and runs past the next beat
pub(crate) fn split_at_beat(
    offset: QuarterLength,
    length: QuarterLength,
    beat: QuarterLength,
) -> Vec<(QuarterLength, QuarterLength)> {
    let position = offset / beat;
    if position.is_integer() {
        return vec![(offset, length)];
    }
    let next_beat = (position.floor() + 1) * beat;
    if offset + length <= next_beat {
        return vec![(offset, length)];
    }
    vec![(offset, next_beat - offset), (next_beat, offset + length - next_beat)]
}

/// First offset after `offset` that lies on the binary grid its
/// denominator implies (1/3 returns to 1, 7/12 to 3/4)
pub(crate) fn next_binary_offset(offset: QuarterLength) -> QuarterLength {
    let mut denom = *offset.denom();
    while denom % 3 == 0 {
        denom /= 3;
    }
    let unit = QuarterLength::new(1, denom);
    ((offset / unit).floor() + 1) * unit
}

/// Values for a stretch starting at `offset`. Off the binary grid, the
/// part up to the next binary offset is written in triplet values.
fn stretch_values(offset: QuarterLength, length: QuarterLength) -> Option<Vec<NoteValue>> {
    if is_binary_offset(offset) {
        return decompose(length);
    }
    let head = length.min(next_binary_offset(offset) - offset);
    let mut values = decompose_triplets(head)?;
    if length > head {
        values.extend(decompose(length - head)?);
    }
    Some(values)
}

/// Turn one bar piece into placed elements, tying the parts of a note
fn notate_piece(piece: &BarPiece, beat: QuarterLength, out: &mut Vec<Placed>) -> std::result::Result<(), String> {
    let mut values = Vec::new();
    for (offset, length) in split_at_beat(piece.offset, piece.length, beat) {
        let parts = stretch_values(offset, length)
            .ok_or_else(|| format!("a {} long stretch at offset {} has no note value", length, offset))?;
        let mut cursor = offset;
        for value in parts {
            values.push((cursor, value));
            cursor += value.length();
        }
    }

    let last = values.len().saturating_sub(1);
    for (i, (offset, value)) in values.into_iter().enumerate() {
        let element = match &piece.content {
            SegmentContent::Rest => NotationElement::rest(value),
            SegmentContent::Note(pitch) => {
                let mut element = NotationElement::note(*pitch, value);
                if let NotationElement::Note(note) = &mut element {
                    note.tie = TieType::from_links(piece.tie_from || i > 0, piece.tie_to || i < last);
                }
                element
            }
        };
        out.push(Placed { offset, element });
    }
    Ok(())
}

fn is_binary_offset(offset: QuarterLength) -> bool {
    offset.denom() % 3 != 0
}

/// Open a bracket on the first triplet value of a run and close it once the
/// run lands back on a binary offset, before a plain value, or at the barline
fn mark_tuplets(placed: &mut [Placed]) {
    let mut open = false;
    let mut last_in_run: Option<usize> = None;

    for i in 0..placed.len() {
        let end = placed[i].end();
        let Some(tuplet) = placed[i].element.tuplet_mut() else {
            if open {
                close_bracket(placed, last_in_run);
                open = false;
            }
            continue;
        };
        if !open {
            tuplet.bracket_start = true;
            open = true;
        }
        last_in_run = Some(i);
        if is_binary_offset(end) {
            tuplet.bracket_stop = true;
            open = false;
        }
    }

    if open {
        close_bracket(placed, last_in_run);
    }
}

fn close_bracket(placed: &mut [Placed], index: Option<usize>) {
    if let Some(tuplet) = index.and_then(|i| placed[i].element.tuplet_mut()) {
        tuplet.bracket_stop = true;
    }
}

/// Beam consecutive flagged notes that start within the same beat
fn mark_beams(placed: &mut [Placed], beat: QuarterLength) {
    let beat_of = |p: &Placed| -> Option<i64> {
        let note = p.element.as_note()?;
        note.note_type.is_flagged().then(|| (p.offset / beat).floor().to_integer())
    };

    let mut start = 0;
    while start < placed.len() {
        let Some(group_beat) = beat_of(&placed[start]) else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end < placed.len() && beat_of(&placed[end]) == Some(group_beat) {
            end += 1;
        }
        if end - start >= 2 {
            for i in start..end {
                let state = if i == start {
                    BeamState::Begin
                } else if i == end - 1 {
                    BeamState::End
                } else {
                    BeamState::Continue
                };
                if let NotationElement::Note(note) = &mut placed[i].element {
                    note.beam = Some(state);
                }
            }
        }
        start = end;
    }
}

/// Print an accidental when a note's alteration differs from what the key
/// signature and earlier notes in the measure imply for its line or space
fn mark_accidentals(placed: &mut [Placed], key: &KeySignature) {
    let mut state: HashMap<(Step, i8), i8> = HashMap::new();

    for p in placed.iter_mut() {
        let NotationElement::Note(note) = &mut p.element else {
            continue;
        };
        if note.tie.map_or(false, |t| t.continues_previous()) {
            continue;
        }
        let slot = (note.pitch.step, note.pitch.octave);
        let current = state.get(&slot).copied().unwrap_or_else(|| key.alter_for_step(note.pitch.step));
        if note.pitch.alter != current {
            note.accidental = Accidental::for_alter(note.pitch.alter);
        }
        state.insert(slot, note.pitch.alter);
    }
}
