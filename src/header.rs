//! # Header Interpreter
//!
//! Turns a header parse tree into a [`Header`]: the piece's metadata plus the
//! still-unparsed body text.
//!
//! ## Defaults
//! - composer: `Unknown`
//! - meter: 4/4
//! - note length (`L:`): 1/16 when the meter is shorter than 3/4, else 1/8
//! - tempo (`Q:`): 100, counted in the note length
//!
//! ## Example
//! ```rust
//! use karaoke::Header;
//!
//! let header = Header::parse("X:1\nT:Waltz\nM:3/4\nQ:1/4=120\nK:G\nB2 d|\n").unwrap();
//! assert_eq!(header.title(), "Waltz");
//! assert_eq!(header.composer(), "Unknown");
//! assert_eq!(header.note_length(), 0.125);
//! assert_eq!(header.beats_per_minute(), 240.0);
//! ```

use crate::error::KaraokeError;
use crate::grammar::{parse, HeaderGrammar, HeaderSymbol, ParseTree};
use crate::key::KeySignature;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;

type Tree = ParseTree<HeaderSymbol>;

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

impl TimeSignature {
    pub fn ratio(&self) -> f64 {
        self.beats as f64 / self.beat_type as f64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    index: u32,
    title: String,
    composer: String,
    time_signature: TimeSignature,
    key: String,
    #[serde(skip)]
    key_signature: KeySignature,
    tempo: u32,
    note_length: f64,
    tempo_length: f64,
    voices: BTreeSet<String>,
    #[serde(skip)]
    music: String,
    #[serde(skip)]
    music_line: usize,
}

impl Header {
    /// Parse and interpret the header of a complete piece.
    pub fn parse(source: &str) -> Result<Self, KaraokeError> {
        let tree = parse::<HeaderGrammar>(HeaderSymbol::Header, source)?;
        Self::from_tree(&tree)
    }

    /// Interpret a tree rooted at [`HeaderSymbol::Header`].
    pub fn from_tree(tree: &Tree) -> Result<Self, KaraokeError> {
        let mut index = 0;
        let mut title = String::new();
        let mut composer = None;
        let mut time_signature = None;
        let mut note_length = None;
        let mut tempo = None;
        let mut voices = BTreeSet::new();
        let mut key = None;
        let mut music = None;

        for child in tree.children() {
            let field = match child.symbol() {
                HeaderSymbol::OtherField => match child.children().first() {
                    Some(inner) => inner,
                    None => continue,
                },
                _ => child,
            };
            match field.symbol() {
                HeaderSymbol::FieldNumber => {
                    index = parse_number("X", value_of(field)?.text())?;
                }
                HeaderSymbol::FieldTitle => title = value_of(field)?.text().to_string(),
                HeaderSymbol::FieldComposer => {
                    composer = Some(value_of(field)?.text().to_string())
                }
                HeaderSymbol::FieldMeter => time_signature = Some(meter(value_of(field)?)?),
                HeaderSymbol::FieldDefaultLength => {
                    note_length = Some(fraction("L", value_of(field)?)?)
                }
                HeaderSymbol::FieldTempo => tempo = Some(tempo_field(value_of(field)?)?),
                HeaderSymbol::FieldVoice => {
                    voices.insert(voice_name(value_of(field)?.text())?);
                }
                HeaderSymbol::FieldKey => key = Some(value_of(field)?.text().to_string()),
                HeaderSymbol::Music => music = Some((field.text().to_string(), field.line())),
                _ => {}
            }
        }

        let key = key.ok_or_else(|| KaraokeError::invalid_field("K", "", "missing key field"))?;
        let key_signature = KeySignature::from_str(&key)
            .ok_or_else(|| KaraokeError::invalid_field("K", &key, "unknown key signature"))?;
        let time_signature = time_signature.unwrap_or_default();
        let note_length = note_length.unwrap_or(if time_signature.ratio() < 0.75 {
            1.0 / 16.0
        } else {
            1.0 / 8.0
        });
        let (tempo, tempo_length) = match tempo {
            Some((bpm, Some(length))) => (bpm, length),
            Some((bpm, None)) => (bpm, note_length),
            None => (100, note_length),
        };
        let (music, music_line) = music.unwrap_or_default();

        let header = Header {
            index,
            title,
            composer: composer.unwrap_or_else(|| "Unknown".to_string()),
            time_signature,
            key,
            key_signature,
            tempo,
            note_length,
            tempo_length,
            voices,
            music,
            music_line,
        };
        debug!(
            "Decoded header X:{} '{}' in {} at {:.1} BPM",
            header.index,
            header.title,
            header.key,
            header.beats_per_minute()
        );
        Ok(header)
    }

    /// Merge voice names declared in the body.
    pub fn add_voices<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.voices.extend(names.into_iter().map(Into::into));
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn composer(&self) -> &str {
        &self.composer
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Key name as written, e.g. `F#m`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn key_signature(&self) -> &KeySignature {
        &self.key_signature
    }

    /// Tempo figure, in tempo-length notes per minute.
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    /// Fraction of a whole note that a bare `1` length denotes.
    pub fn note_length(&self) -> f64 {
        self.note_length
    }

    pub fn tempo_length(&self) -> f64 {
        self.tempo_length
    }

    pub fn voices(&self) -> &BTreeSet<String> {
        &self.voices
    }

    /// The body text following the key field.
    pub fn music(&self) -> &str {
        &self.music
    }

    /// File line on which the body text starts.
    pub fn music_line(&self) -> usize {
        self.music_line
    }

    /// Playback rate in note-length units per minute.
    pub fn beats_per_minute(&self) -> f64 {
        self.tempo as f64 * self.tempo_length / self.note_length
    }
}

fn value_of(field: &Tree) -> Result<&Tree, KaraokeError> {
    field
        .children()
        .first()
        .ok_or_else(|| KaraokeError::invalid_field(format!("{:?}", field.symbol()), field.text(), "empty field"))
}

fn parse_number(field: &str, digits: &str) -> Result<u32, KaraokeError> {
    digits
        .parse()
        .map_err(|_| KaraokeError::invalid_field(field, digits, "number out of range"))
}

fn fraction(field: &str, tree: &Tree) -> Result<f64, KaraokeError> {
    let mut parts = tree.children_of(HeaderSymbol::Digits);
    let (numerator, denominator) = match (parts.next(), parts.next()) {
        (Some(n), Some(d)) => (parse_number(field, n.text())?, parse_number(field, d.text())?),
        _ => return Err(KaraokeError::invalid_field(field, tree.text(), "expected n/m")),
    };
    if numerator == 0 || denominator == 0 {
        return Err(KaraokeError::invalid_field(
            field,
            tree.text(),
            "fraction must be positive",
        ));
    }
    Ok(numerator as f64 / denominator as f64)
}

fn meter(tree: &Tree) -> Result<TimeSignature, KaraokeError> {
    let inner = tree
        .children()
        .first()
        .ok_or_else(|| KaraokeError::invalid_field("M", tree.text(), "empty meter"))?;
    match inner.symbol() {
        HeaderSymbol::CommonTime => Ok(TimeSignature::default()),
        HeaderSymbol::CutTime => Ok(TimeSignature {
            beats: 2,
            beat_type: 2,
        }),
        _ => {
            let mut parts = inner.children_of(HeaderSymbol::Digits);
            let beats = parse_number("M", parts.next().map_or("", |d| d.text()))?;
            let beat_type = parse_number("M", parts.next().map_or("", |d| d.text()))?;
            if beats == 0 || beat_type == 0 {
                return Err(KaraokeError::invalid_field("M", inner.text(), "meter must be positive"));
            }
            Ok(TimeSignature { beats, beat_type })
        }
    }
}

fn tempo_field(tree: &Tree) -> Result<(u32, Option<f64>), KaraokeError> {
    let length = match tree.child(HeaderSymbol::Fraction) {
        Some(f) => Some(fraction("Q", f)?),
        None => None,
    };
    let bpm = tree
        .child(HeaderSymbol::Digits)
        .map_or(Ok(0), |d| parse_number("Q", d.text()))?;
    if bpm == 0 {
        return Err(KaraokeError::invalid_field("Q", tree.text(), "tempo must be positive"));
    }
    Ok((bpm, length))
}

/// Trimmed, non-empty voice name.
pub(crate) fn voice_name(text: &str) -> Result<String, KaraokeError> {
    let name = text.trim();
    if name.is_empty() {
        return Err(KaraokeError::invalid_field("V", text, "voice name is empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn header(fields: &str) -> Header {
        Header::parse(&format!("X:1\nT:Test\n{}K:C\nC|\n", fields)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let h = header("");
        assert_eq!(h.index(), 1);
        assert_eq!(h.composer(), "Unknown");
        assert_eq!(h.time_signature(), TimeSignature { beats: 4, beat_type: 4 });
        assert_eq!(h.tempo(), 100);
        assert_approx_eq!(h.note_length(), 0.125);
        assert_approx_eq!(h.tempo_length(), 0.125);
        assert_approx_eq!(h.beats_per_minute(), 100.0);
        assert!(h.voices().is_empty());
        assert_eq!(h.music(), "C|\n");
        assert_eq!(h.music_line(), 4);
    }

    #[test]
    fn test_default_note_length_follows_meter() {
        assert_approx_eq!(header("M:6/8\n").note_length(), 1.0 / 8.0);
        assert_approx_eq!(header("M:2/4\n").note_length(), 1.0 / 16.0);
        assert_approx_eq!(header("M:C|\n").note_length(), 1.0 / 8.0);
        assert_approx_eq!(header("M:3/4\n").note_length(), 1.0 / 8.0);
    }

    #[test]
    fn test_meter_symbols() {
        assert_eq!(header("M:C\n").time_signature(), TimeSignature { beats: 4, beat_type: 4 });
        assert_eq!(header("M:C|\n").time_signature(), TimeSignature { beats: 2, beat_type: 2 });
        assert_eq!(header("M:7/8\n").time_signature(), TimeSignature { beats: 7, beat_type: 8 });
    }

    #[test]
    fn test_explicit_tempo_and_length() {
        let h = header("L:1/4\nQ:1/8=200\n");
        assert_approx_eq!(h.note_length(), 0.25);
        assert_approx_eq!(h.tempo_length(), 0.125);
        assert_eq!(h.tempo(), 200);
        assert_approx_eq!(h.beats_per_minute(), 100.0);
    }

    #[test]
    fn test_bare_tempo_uses_note_length() {
        let h = header("L:1/4\nQ:90\n");
        assert_approx_eq!(h.tempo_length(), 0.25);
        assert_approx_eq!(h.beats_per_minute(), 90.0);
    }

    #[test]
    fn test_title_and_composer_keep_their_text() {
        let h = Header::parse("X:1\nT:Song of Songs  % working title\nC:Anon. \nK:C\nC|\n").unwrap();
        assert_eq!(h.title(), "Song of Songs  ");
        assert_eq!(h.composer(), "Anon. ");
    }

    #[test]
    fn test_text_fields_and_voices() {
        let h = header("C: Jane Roe\nV:upper\nV:lower\nV:upper\n");
        assert_eq!(h.title(), "Test");
        assert_eq!(h.composer(), "Jane Roe");
        let voices: Vec<_> = h.voices().iter().cloned().collect();
        assert_eq!(voices, vec!["lower".to_string(), "upper".to_string()]);
    }

    #[test]
    fn test_minor_key() {
        let h = Header::parse("X:2\nT:Minor\nK:Ebm\n").unwrap();
        assert_eq!(h.key(), "Ebm");
        assert_eq!(h.key_signature().fifths, -6);
    }

    #[test]
    fn test_invalid_values() {
        for fields in ["L:1/0\n", "M:0/4\n", "Q:1/4=0\n", "V: \n"] {
            let err = Header::parse(&format!("X:1\nT:Bad\n{}K:C\n", fields)).unwrap_err();
            assert!(
                matches!(err, KaraokeError::InvalidFieldValue { .. }),
                "{:?} gave {:?}",
                fields,
                err
            );
        }
    }

    #[test]
    fn test_unknown_key_is_invalid_field() {
        let err = Header::parse("X:1\nT:Bad\nK:Fb\n").unwrap_err();
        match err {
            KaraokeError::InvalidFieldValue { field, value, .. } => {
                assert_eq!(field, "K");
                assert_eq!(value, "Fb");
            }
            other => panic!("Expected InvalidFieldValue, got {:?}", other),
        }
    }

    #[test]
    fn test_add_voices_deduplicates() {
        let mut h = header("V:a\n");
        h.add_voices(["b", "a"]);
        assert_eq!(h.voices().len(), 2);
    }
}
