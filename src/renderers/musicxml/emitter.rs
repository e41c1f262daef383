//! MusicXML emitter - walks a `Score` and produces a MusicXML string

use log::debug;

use super::builder::MusicXmlBuilder;
use super::helpers::divisions_for;
use crate::ir::{NotationElement, Score};
use crate::renderers::{NotationSerializer, SerializeError};

/// Emit a complete single-part MusicXML 3.1 document
pub fn emit_musicxml(score: &Score) -> Result<String, SerializeError> {
    let part = match score.parts.as_slice() {
        [part] => part,
        parts => {
            return Err(SerializeError::InvalidDocument(format!(
                "expected exactly one part, found {}",
                parts.len()
            )))
        }
    };

    let divisions = divisions_for(score);
    let capacity = part.time.measure_length();

    let mut builder = MusicXmlBuilder::new();
    builder.set_title(score.title.clone());
    builder.set_part(&part.id, &part.name);
    builder.set_key_signature(part.key);
    builder.set_time_signature(part.time);
    builder.set_clef(part.clef);
    builder.set_divisions(divisions);

    for measure in &part.measures {
        builder.start_measure(measure.number);
        for element in &measure.elements {
            match element {
                NotationElement::Note(note) => builder.write_note(note)?,
                NotationElement::Rest(rest) => {
                    let whole_measure = measure.elements.len() == 1 && rest.duration == capacity;
                    builder.write_rest(rest, whole_measure)?
                }
            }
        }
        builder.end_measure();
    }

    debug!(
        "emitted MusicXML: {} measures, {} divisions per quarter",
        part.measures.len(),
        divisions
    );
    Ok(builder.finalize())
}

/// MusicXML 3.1 partwise serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct MusicXmlSerializer;

impl NotationSerializer for MusicXmlSerializer {
    fn serialize(&self, score: &Score) -> Result<Vec<u8>, SerializeError> {
        emit_musicxml(score).map(String::into_bytes)
    }

    fn extension(&self) -> &'static str {
        "musicxml"
    }

    fn media_type(&self) -> &'static str {
        "application/vnd.recordare.musicxml+xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::spell_pitch;
    use crate::cleanup::SpelledEvent;
    use crate::ir::assemble;
    use crate::models::{KeySignature, QuarterLength, TimeSignature};

    fn q(n: i64, d: i64) -> QuarterLength {
        QuarterLength::new(n, d)
    }

    fn score(events: &[(QuarterLength, QuarterLength, i16)]) -> Score {
        let spelled: Vec<_> = events
            .iter()
            .map(|(onset, duration, pitch)| SpelledEvent {
                onset: *onset,
                duration: *duration,
                pitches: vec![spell_pitch(*pitch, None)],
            })
            .collect();
        assemble(&spelled, KeySignature::C_MAJOR, TimeSignature::COMMON, Some("Tune".to_string()), "Violin").unwrap()
    }

    #[test]
    fn test_divisions_cover_triplets_and_sixteenths() {
        let s = score(&[(q(0, 1), q(1, 3), 67), (q(1, 3), q(2, 3), 69), (q(1, 1), q(1, 4), 71)]);
        let xml = emit_musicxml(&s).unwrap();
        assert!(xml.contains("<divisions>12</divisions>"));
        assert!(xml.contains("<actual-notes>3</actual-notes>"));
    }

    #[test]
    fn test_empty_score_gets_measure_rest() {
        let xml = emit_musicxml(&score(&[])).unwrap();
        assert!(xml.contains("<rest measure=\"yes\"/>"));
        assert!(xml.contains("<duration>4</duration>"));
    }

    #[test]
    fn test_rejects_multi_part_scores() {
        let mut s = score(&[(q(0, 1), q(1, 1), 67)]);
        s.parts.push(s.parts[0].clone());
        assert!(matches!(emit_musicxml(&s), Err(SerializeError::InvalidDocument(_))));
    }

    #[test]
    fn test_serializer_trait() {
        let s = score(&[(q(0, 1), q(4, 1), 72)]);
        let bytes = MusicXmlSerializer.serialize(&s).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("<score-partwise version=\"3.1\">"));
        assert_eq!(MusicXmlSerializer.extension(), "musicxml");
    }
}
