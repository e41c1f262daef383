//! Measurization: from a note timeline to full bars
//!
//! ```text
//! SpelledEvent[] → build_timeline → Segment[] (notes + rests, gapless)
//!                → slice_into_bars → Bar[] (ties across barlines, last bar padded)
//! ```
//!
//! Durations stay exact rationals all the way through; a bar is full when
//! its pieces add up to the measure length.

use crate::cleanup::SpelledEvent;
use crate::error::{PipelineError, Result};
use crate::models::{QuarterLength, SpelledPitch};

/// What sounds during a segment
#[derive(Clone, Debug, PartialEq)]
pub enum SegmentContent {
    Note(SpelledPitch),
    Rest,
}

/// Stretch of the gapless timeline
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub start: QuarterLength,
    pub length: QuarterLength,
    pub content: SegmentContent,
}

/// Part of a segment that falls within one bar
#[derive(Clone, Debug, PartialEq)]
pub struct BarPiece {
    /// Offset from the start of the bar
    pub offset: QuarterLength,
    pub length: QuarterLength,
    pub content: SegmentContent,
    /// Continues a piece from the previous bar
    pub tie_from: bool,
    /// Continues into the next bar
    pub tie_to: bool,
}

/// A single bar (measure) of pieces
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    /// 1-based
    pub number: usize,
    pub pieces: Vec<BarPiece>,
}

impl Bar {
    pub fn filled(&self) -> QuarterLength {
        self.pieces.iter().map(|p| p.length).sum()
    }
}

/// Lay events end to end from time zero, inserting rests for silences.
///
/// Events must be onset-sorted and non-overlapping.
pub fn build_timeline(events: &[SpelledEvent], measure_length: QuarterLength) -> Result<Vec<Segment>> {
    let mut cursor = QuarterLength::from_integer(0);
    let mut segments = Vec::with_capacity(events.len() * 2);

    for event in events {
        if event.onset < cursor {
            let measure = (event.onset / measure_length).floor().to_integer() as usize + 1;
            return Err(PipelineError::AssemblyOverflow {
                measure,
                detail: format!("event at {} overlaps the previous note ending at {}", event.onset, cursor),
            });
        }
        if event.onset > cursor {
            segments.push(Segment {
                start: cursor,
                length: event.onset - cursor,
                content: SegmentContent::Rest,
            });
        }
        let content = match event.top() {
            Some(pitch) => SegmentContent::Note(pitch),
            None => SegmentContent::Rest,
        };
        segments.push(Segment { start: event.onset, length: event.duration, content });
        cursor = event.end();
    }

    Ok(segments)
}

/// Append a rest so the timeline ends on a barline (at least one bar)
pub fn pad_to_bar_boundary(segments: &mut Vec<Segment>, measure_length: QuarterLength) {
    let end = segments
        .last()
        .map(|s| s.start + s.length)
        .unwrap_or_else(|| QuarterLength::from_integer(0));
    let bars = (end / measure_length).ceil().to_integer().max(1);
    let total = measure_length * bars;
    if end < total {
        segments.push(Segment { start: end, length: total - end, content: SegmentContent::Rest });
    }
}

/// Slice segments into bars, splitting anything that crosses a barline.
/// Split notes are marked `tie_to` / `tie_from`; split rests are not.
pub fn slice_into_bars(segments: &[Segment], measure_length: QuarterLength) -> Vec<Bar> {
    let zero = QuarterLength::from_integer(0);
    let mut bars: Vec<Bar> = Vec::new();
    let mut current: Vec<BarPiece> = Vec::new();
    let mut filled = zero;

    for segment in segments {
        let is_note = matches!(segment.content, SegmentContent::Note(_));
        let mut remaining = segment.length;
        let mut is_first_chunk = true;

        while remaining > zero {
            let space = measure_length - filled;
            let length = if remaining <= space { remaining } else { space };
            remaining -= length;

            current.push(BarPiece {
                offset: filled,
                length,
                content: segment.content.clone(),
                tie_from: is_note && !is_first_chunk,
                tie_to: is_note && remaining > zero,
            });
            filled += length;
            is_first_chunk = false;

            if filled == measure_length {
                bars.push(Bar { number: bars.len() + 1, pieces: std::mem::take(&mut current) });
                filled = zero;
            }
        }
    }

    if !current.is_empty() {
        bars.push(Bar { number: bars.len() + 1, pieces: current });
    }
    bars
}

/// Timeline, padding and slicing in one go
pub fn measurize(events: &[SpelledEvent], measure_length: QuarterLength) -> Result<Vec<Bar>> {
    let mut segments = build_timeline(events, measure_length)?;
    pad_to_bar_boundary(&mut segments, measure_length);
    Ok(slice_into_bars(&segments, measure_length))
}
