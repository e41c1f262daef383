//! MusicXML text builder

use crate::ir::{Clef, NotatedNote, NotatedRest, TieType};
use crate::models::{KeySignature, Mode, QuarterLength, TimeSignature};
use crate::renderers::SerializeError;

/// Builds a single-part MusicXML 3.1 partwise document as text
pub struct MusicXmlBuilder {
    buffer: String,
    measure_started: bool,
    attributes_written: bool,
    title: Option<String>,
    part_id: String,
    part_name: String,
    key: KeySignature,
    time: TimeSignature,
    clef: Clef,
    /// Divisions per quarter note
    divisions: i64,
}

impl MusicXmlBuilder {
    /// Create a new MusicXML builder
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            measure_started: false,
            attributes_written: false,
            title: None,
            part_id: "P1".to_string(),
            part_name: String::new(),
            key: KeySignature::C_MAJOR,
            time: TimeSignature::COMMON,
            clef: Clef::Treble,
            divisions: 1,
        }
    }

    /// Set the document title
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn set_part(&mut self, id: &str, name: &str) {
        self.part_id = id.to_string();
        self.part_name = name.to_string();
    }

    pub fn set_key_signature(&mut self, key: KeySignature) {
        self.key = key;
    }

    pub fn set_time_signature(&mut self, time: TimeSignature) {
        self.time = time;
    }

    pub fn set_clef(&mut self, clef: Clef) {
        self.clef = clef;
    }

    pub fn set_divisions(&mut self, divisions: i64) {
        self.divisions = divisions.max(1);
    }

    /// Start a measure; the first one carries the attributes block
    pub fn start_measure(&mut self, number: usize) {
        self.buffer.push_str(&format!("    <measure number=\"{}\">\n", number));
        self.measure_started = true;

        if !self.attributes_written {
            self.write_attributes();
            self.attributes_written = true;
        }
    }

    /// Close current measure
    pub fn end_measure(&mut self) {
        if self.measure_started {
            self.buffer.push_str("    </measure>\n");
            self.measure_started = false;
        }
    }

    /// Length in divisions; fails if the divisions value cannot express it
    pub fn to_divisions(&self, length: QuarterLength) -> Result<i64, SerializeError> {
        let scaled = length * self.divisions;
        if !scaled.is_integer() {
            return Err(SerializeError::InvalidDocument(format!(
                "duration {} is not a whole number of {} divisions per quarter",
                length, self.divisions
            )));
        }
        Ok(scaled.to_integer())
    }

    /// Write a pitched note with its ties, beam, accidental and tuplet marks
    pub fn write_note(&mut self, note: &NotatedNote) -> Result<(), SerializeError> {
        let duration = self.to_divisions(note.duration)?;

        self.buffer.push_str("      <note>\n");
        self.buffer.push_str("        <pitch>\n");
        self.buffer.push_str(&format!("          <step>{}</step>\n", note.pitch.step));
        if note.pitch.alter != 0 {
            self.buffer.push_str(&format!("          <alter>{}</alter>\n", note.pitch.alter));
        }
        self.buffer.push_str(&format!("          <octave>{}</octave>\n", note.pitch.octave));
        self.buffer.push_str("        </pitch>\n");
        self.buffer.push_str(&format!("        <duration>{}</duration>\n", duration));

        // <tie> is the sounding tie and comes before <voice>; continue = stop + start
        let tie_types = tie_type_names(note.tie);
        for tie_type in &tie_types {
            self.buffer.push_str(&format!("        <tie type=\"{}\"/>\n", tie_type));
        }

        self.write_voice_type_dots(note.voice, note.note_type.xml_name(), note.dots);

        if let Some(accidental) = note.accidental {
            self.buffer.push_str(&format!("        <accidental>{}</accidental>\n", accidental.xml_name()));
        }

        let tuplet = note.tuplet;
        if let Some(t) = tuplet {
            self.write_time_modification(t.actual_notes, t.normal_notes);
        }

        if let Some(beam) = note.beam {
            self.buffer.push_str(&format!("        <beam number=\"1\">{}</beam>\n", beam.as_str()));
        }

        let bracket = tuplet.and_then(|t| tuplet_bracket(t.bracket_start, t.bracket_stop));
        if !tie_types.is_empty() || bracket.is_some() {
            self.buffer.push_str("        <notations>\n");
            for tie_type in &tie_types {
                self.buffer.push_str(&format!("          <tied type=\"{}\"/>\n", tie_type));
            }
            self.write_tuplet_brackets(bracket);
            self.buffer.push_str("        </notations>\n");
        }

        self.buffer.push_str("      </note>\n");
        Ok(())
    }

    /// Write a rest; a rest filling the whole measure is written as a measure rest
    pub fn write_rest(&mut self, rest: &NotatedRest, whole_measure: bool) -> Result<(), SerializeError> {
        let duration = self.to_divisions(rest.duration)?;

        self.buffer.push_str("      <note>\n");
        if whole_measure {
            self.buffer.push_str("        <rest measure=\"yes\"/>\n");
        } else {
            self.buffer.push_str("        <rest/>\n");
        }
        self.buffer.push_str(&format!("        <duration>{}</duration>\n", duration));
        self.write_voice_type_dots(rest.voice, rest.note_type.xml_name(), rest.dots);

        if let Some(t) = rest.tuplet {
            self.write_time_modification(t.actual_notes, t.normal_notes);
            let bracket = tuplet_bracket(t.bracket_start, t.bracket_stop);
            if bracket.is_some() {
                self.buffer.push_str("        <notations>\n");
                self.write_tuplet_brackets(bracket);
                self.buffer.push_str("        </notations>\n");
            }
        }

        self.buffer.push_str("      </note>\n");
        Ok(())
    }

    fn write_voice_type_dots(&mut self, voice: u8, note_type: &str, dots: u8) {
        self.buffer.push_str(&format!("        <voice>{}</voice>\n", u16::from(voice) + 1));
        self.buffer.push_str(&format!("        <type>{}</type>\n", note_type));
        for _ in 0..dots {
            self.buffer.push_str("        <dot/>\n");
        }
    }

    fn write_time_modification(&mut self, actual_notes: u8, normal_notes: u8) {
        self.buffer.push_str("        <time-modification>\n");
        self.buffer.push_str(&format!("          <actual-notes>{}</actual-notes>\n", actual_notes));
        self.buffer.push_str(&format!("          <normal-notes>{}</normal-notes>\n", normal_notes));
        self.buffer.push_str("        </time-modification>\n");
    }

    fn write_tuplet_brackets(&mut self, bracket: Option<&[&str]>) {
        for bracket_type in bracket.unwrap_or(&[]) {
            self.buffer.push_str(&format!(
                "          <tuplet type=\"{}\" bracket=\"yes\" show-number=\"actual\" number=\"1\"/>\n",
                bracket_type
            ));
        }
    }

    /// Wrap the measures in the partwise header and part list
    pub fn finalize(mut self) -> String {
        self.end_measure();

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<!DOCTYPE score-partwise PUBLIC \"-//Recordare//DTD MusicXML 3.1 Partwise//EN\" \"http://www.musicxml.org/dtds/partwise.dtd\">\n");
        xml.push_str("<score-partwise version=\"3.1\">\n");

        if let Some(title) = &self.title {
            if !title.is_empty() {
                xml.push_str("  <movement-title>");
                xml.push_str(&xml_escape(title));
                xml.push_str("</movement-title>\n");
            }
        }

        let part_id = xml_escape(&self.part_id);
        xml.push_str("  <part-list>\n");
        xml.push_str(&format!("    <score-part id=\"{}\">\n", part_id));
        xml.push_str(&format!("      <part-name>{}</part-name>\n", xml_escape(&self.part_name)));
        xml.push_str("    </score-part>\n");
        xml.push_str("  </part-list>\n");
        xml.push_str(&format!("  <part id=\"{}\">\n", part_id));
        xml.push_str(&self.buffer);
        xml.push_str("  </part>\n");
        xml.push_str("</score-partwise>\n");
        xml
    }

    /// Write MusicXML attributes (divisions, key, time, clef)
    fn write_attributes(&mut self) {
        let mode = match self.key.mode {
            Mode::Major => "major",
            Mode::Minor => "minor",
        };
        self.buffer.push_str("      <attributes>\n");
        self.buffer.push_str(&format!("        <divisions>{}</divisions>\n", self.divisions));
        self.buffer.push_str(&format!(
            "        <key><fifths>{}</fifths><mode>{}</mode></key>\n",
            self.key.fifths, mode
        ));
        self.buffer.push_str(&format!(
            "        <time><beats>{}</beats><beat-type>{}</beat-type></time>\n",
            self.time.beats, self.time.beat_type
        ));
        self.buffer.push_str(&format!(
            "        <clef><sign>{}</sign><line>{}</line></clef>\n",
            self.clef.sign(),
            self.clef.line()
        ));
        self.buffer.push_str("      </attributes>\n");
    }
}

impl Default for MusicXmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn tie_type_names(tie: Option<TieType>) -> Vec<&'static str> {
    match tie {
        Some(TieType::Start) => vec!["start"],
        Some(TieType::Continue) => vec!["stop", "start"],
        Some(TieType::Stop) => vec!["stop"],
        None => Vec::new(),
    }
}

fn tuplet_bracket(start: bool, stop: bool) -> Option<&'static [&'static str]> {
    match (start, stop) {
        (true, true) => Some(&["start", "stop"][..]),
        (true, false) => Some(&["start"][..]),
        (false, true) => Some(&["stop"][..]),
        (false, false) => None,
    }
}

/// Escape text for element content and attribute values
pub fn xml_escape(s: &str) -> String {
    quick_xml::escape::escape(s).into_owned()
}
