//! # AST Builder
//!
//! Walks a body parse tree and builds the piece's [`Music`].
//!
//! ## State
//! - **Measure accidentals**: the accidental last written on each pitch (as
//!   spelled, so `C` and `c'` are tracked apart). Cleared by a plain `|`.
//! - **Repeat state, per voice**: a buffer of everything since the last `|:`
//!   and whether a `[1`/`[2` ending marker has been passed since then.
//!
//! ## Repeats
//! - `|:` empties the buffer
//! - `[1` / `[2` stop further material from entering the buffer
//! - `:|` plays the buffer once more and empties it
//!
//! ## Voices
//! Lines belong to the most recent `V:` field (`unknown` before any). Each
//! voice's lines are concatenated in source order, and the voices are
//! overlaid in order of first appearance.

use crate::error::KaraokeError;
use crate::grammar::{tuplet_size, BodySymbol, ParseTree};
use crate::header::{voice_name, Header};
use crate::key::{Accidental, NoteName};
use crate::lyrics::{align, tokenize};
use crate::music::{parse_length, Music, Note};
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

type Tree = ParseTree<BodySymbol>;

pub const DEFAULT_VOICE: &str = "unknown";

/// Names of every `V:` field in the body, in order of appearance.
pub fn body_voices(body: &Tree) -> Result<Vec<String>, KaraokeError> {
    body.children_of(BodySymbol::FieldVoice)
        .map(|field| voice_name(field.child(BodySymbol::Text).map_or("", |t| t.text())))
        .collect()
}

/// Build the music of a body tree rooted at [`BodySymbol::Body`].
pub fn build(body: &Tree, header: Arc<Header>) -> Result<Music, KaraokeError> {
    let mut state = BuildState::new(Arc::clone(&header));
    for line in body.children() {
        match line.symbol() {
            BodySymbol::FieldVoice => {
                let name = voice_name(line.child(BodySymbol::Text).map_or("", |t| t.text()))?;
                state.select_voice(name);
            }
            BodySymbol::MusicLine => {
                let music = state.music_line(line)?;
                state.finish_line(music);
            }
            _ => {}
        }
    }
    Ok(state.assemble())
}

/// Repeat bookkeeping for one voice.
#[derive(Default)]
struct VoiceState {
    repeat: Vec<Music>,
    first_ending_seen: bool,
}

struct BuildState {
    header: Arc<Header>,
    voice: String,
    measure_accidentals: HashMap<String, Accidental>,
    voices: HashMap<String, VoiceState>,
    lines: HashMap<String, Vec<Music>>,
    order: Vec<String>,
}

impl BuildState {
    fn new(header: Arc<Header>) -> Self {
        let mut voices = HashMap::new();
        voices.insert(DEFAULT_VOICE.to_string(), VoiceState::default());
        Self {
            header,
            voice: DEFAULT_VOICE.to_string(),
            measure_accidentals: HashMap::new(),
            voices,
            lines: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn select_voice(&mut self, name: String) {
        trace!("Switching to voice '{}'", name);
        self.voices.entry(name.clone()).or_default();
        self.voice = name;
    }

    fn current(&mut self) -> &mut VoiceState {
        self.voices.entry(self.voice.clone()).or_default()
    }

    fn rest(&self, duration: f64) -> Music {
        Music::rest(duration, Arc::clone(&self.header))
    }

    /// Append `piece` to the line, and to the repeat buffer unless an ending
    /// marker has been passed.
    fn push(&mut self, parts: &mut Vec<Music>, piece: Music) {
        let voice = self.current();
        if !voice.first_ending_seen {
            voice.repeat.push(piece.clone());
        }
        parts.push(piece);
    }

    fn music_line(&mut self, line: &Tree) -> Result<Music, KaraokeError> {
        let mut parts = Vec::new();
        for element in line.children_of(BodySymbol::Element) {
            let Some(inner) = element.children().first() else {
                continue;
            };
            match inner.symbol() {
                BodySymbol::NoteElement => {
                    let piece = self.note_element(inner, 1.0)?;
                    self.push(&mut parts, piece);
                }
                BodySymbol::Rest => {
                    let piece = self.rest(length_of(inner)?);
                    self.push(&mut parts, piece);
                }
                BodySymbol::Tuplet => {
                    let factor = tuplet_factor(inner)?;
                    for member in inner.children_of(BodySymbol::NoteElement) {
                        let piece = self.note_element(member, factor)?;
                        self.push(&mut parts, piece);
                    }
                }
                BodySymbol::Barline => self.barline(inner.text(), &mut parts),
                BodySymbol::NthRepeat => {
                    trace!("Ending {} in voice '{}'", inner.text(), self.voice);
                    self.current().first_ending_seen = true;
                }
                _ => {}
            }
        }

        let mut music = Music::sequence(parts, Arc::clone(&self.header));
        if let Some(lyric) = line.child(BodySymbol::Lyric) {
            let syllables = align(&self.voice, &tokenize(lyric));
            trace!(
                "Aligning {} syllables to {} slots at line {}",
                syllables.len(),
                music.free_slots(),
                lyric.line()
            );
            music = music.bind_syllables(syllables);
        }
        Ok(music)
    }

    fn barline(&mut self, bar: &str, parts: &mut Vec<Music>) {
        match bar {
            "|" => self.measure_accidentals.clear(),
            "|:" => *self.current() = VoiceState::default(),
            ":|" => {
                let repeated = std::mem::take(&mut self.current().repeat);
                trace!("Repeating {} elements", repeated.len());
                parts.extend(repeated);
            }
            _ => {}
        }
    }

    fn note_element(&mut self, element: &Tree, tuplet: f64) -> Result<Music, KaraokeError> {
        let Some(inner) = element.children().first() else {
            return Ok(self.rest(0.0));
        };
        match inner.symbol() {
            BodySymbol::Chord => {
                let mut notes = inner.children_of(BodySymbol::Note);
                let first = match notes.next() {
                    Some(n) => self.note(n, tuplet)?,
                    None => return Ok(self.rest(0.0)),
                };
                notes.try_fold(first, |chord, n| -> Result<Music, KaraokeError> {
                    let next = self.note(n, tuplet)?;
                    Ok(Music::chord(chord, next, Arc::clone(&self.header)))
                })
            }
            _ => self.note(inner, tuplet),
        }
    }

    fn note(&mut self, note: &Tree, tuplet: f64) -> Result<Music, KaraokeError> {
        let pitch = note
            .child(BodySymbol::Pitch)
            .ok_or_else(|| KaraokeError::invalid_field("note", note.text(), "missing pitch"))?;
        let base = pitch.child(BodySymbol::BaseNote).map_or("", |b| b.text());
        let marks = pitch.child(BodySymbol::Octave).map_or("", |o| o.text());
        let (letter, lowercase) = base
            .chars()
            .next()
            .and_then(|c| NoteName::from_char(c).map(|n| (n, c.is_ascii_lowercase())))
            .ok_or_else(|| KaraokeError::invalid_field("note", note.text(), "unknown note letter"))?;

        let spelled = format!("{}{}", base, marks);
        let explicit = match pitch.child(BodySymbol::Accidental) {
            Some(a) => Some(
                Accidental::from_abc(a.text())
                    .ok_or_else(|| KaraokeError::invalid_field("accidental", a.text(), "unknown accidental"))?,
            ),
            None => None,
        };
        let accidental = match explicit {
            Some(accidental) => {
                self.measure_accidentals.insert(spelled, accidental);
                accidental
            }
            None => match self.measure_accidentals.get(&spelled) {
                Some(recorded) => *recorded,
                None => self.header.key_signature().accidental_for_note(letter),
            },
        };

        let octave = i8::from(lowercase) + octave_offset(marks);
        let length = length_of(note)?;
        Ok(Music::Note(Note::new(
            letter,
            octave,
            accidental.semitones() as i8,
            length,
            tuplet,
            Arc::clone(&self.header),
        )))
    }

    fn finish_line(&mut self, music: Music) {
        if !self.lines.contains_key(&self.voice) {
            self.order.push(self.voice.clone());
        }
        self.lines.entry(self.voice.clone()).or_default().push(music);
    }

    fn assemble(mut self) -> Music {
        let mut piece = self.rest(0.0);
        for voice in &self.order {
            let lines = self.lines.remove(voice).unwrap_or_default();
            let count = lines.len();
            let music = Music::sequence(lines, Arc::clone(&self.header));
            debug!(
                "Voice '{}': {} lines, {} beats",
                voice,
                count,
                music.duration()
            );
            piece = Music::overlay(piece, music);
        }
        piece
    }
}

/// Net octave shift of `'` and `,` marks.
fn octave_offset(marks: &str) -> i8 {
    marks.chars().fold(0i8, |acc, c| match c {
        '\'' => acc.saturating_add(1),
        ',' => acc.saturating_sub(1),
        _ => acc,
    })
}

fn length_of(tree: &Tree) -> Result<f64, KaraokeError> {
    parse_length(tree.child(BodySymbol::NoteLength).map_or("", |l| l.text()))
}

/// `(2` is two in the time of three, `(3` three in the time of two, `(4`
/// four in the time of three.
fn tuplet_factor(tuplet: &Tree) -> Result<f64, KaraokeError> {
    let spec = tuplet
        .child(BodySymbol::TupletSpec)
        .ok_or_else(|| KaraokeError::invalid_field("tuplet", tuplet.text(), "missing tuplet size"))?;
    match tuplet_size(spec) {
        Some(2) => Ok(3.0 / 2.0),
        Some(3) => Ok(2.0 / 3.0),
        Some(4) => Ok(3.0 / 4.0),
        _ => Err(KaraokeError::invalid_field("tuplet", spec.text(), "size must be 2, 3 or 4")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use assert_approx_eq::assert_approx_eq;

    fn piece(key: &str, body: &str) -> Music {
        compile(&format!("X:1\nT:Builder\nK:{}\n{}", key, body))
            .unwrap()
            .music()
            .clone()
    }

    fn midi(music: &Music) -> Vec<u8> {
        music.notes().iter().map(|n| n.pitch().midi_note()).collect()
    }

    #[test]
    fn test_measure_accidentals_carry_until_bar() {
        let music = piece("C", "^C C | C\n");
        assert_eq!(midi(&music), vec![61, 61, 60]);
    }

    #[test]
    fn test_measure_accidentals_are_per_octave() {
        assert_eq!(midi(&piece("C", "_B b B\n")), vec![70, 83, 70]);
    }

    #[test]
    fn test_explicit_accidental_replaces_recorded() {
        assert_eq!(midi(&piece("C", "^F F =F F\n")), vec![66, 66, 65, 65]);
    }

    #[test]
    fn test_key_signature_defaults() {
        assert_eq!(midi(&piece("G", "F f B\n")), vec![66, 78, 71]);
        assert_eq!(midi(&piece("F", "B E\n")), vec![70, 64]);
        assert_eq!(midi(&piece("G", "=F F | F\n")), vec![65, 65, 66]);
    }

    #[test]
    fn test_repeat_barlines_keep_accidentals() {
        assert_eq!(midi(&piece("C", "^C |: C :| C | C\n")), vec![61, 61, 61, 61, 60]);
    }

    #[test]
    fn test_octave_marks() {
        assert_eq!(midi(&piece("C", "C, C c c' c''\n")), vec![48, 60, 72, 84, 96]);
    }

    #[test]
    fn test_simple_repeat() {
        let music = piece("C", "|: C D E :|\n");
        assert_eq!(midi(&music), vec![60, 62, 64, 60, 62, 64]);
        assert_approx_eq!(music.duration(), 6.0);
    }

    #[test]
    fn test_repeat_from_start_without_open_bar() {
        assert_eq!(midi(&piece("C", "C D :| E\n")), vec![60, 62, 60, 62, 64]);
    }

    #[test]
    fn test_first_and_second_endings() {
        let music = piece("C", "|: A B [1 C D :|[2 E F |\n");
        assert_eq!(midi(&music), vec![69, 71, 60, 62, 69, 71, 64, 65]);
    }

    #[test]
    fn test_ending_material_is_played_once() {
        let music = piece("C", "|:[1 C D E | C D E :|[2 F G A |\n");
        assert_eq!(midi(&music), vec![60, 62, 64, 60, 62, 64, 65, 67, 69]);
    }

    #[test]
    fn test_repeat_spans_lines() {
        let music = piece("C", "|: C D |\nE F :|\n");
        assert_eq!(midi(&music), vec![60, 62, 64, 65, 60, 62, 64, 65]);
    }

    #[test]
    fn test_tuplet_factors() {
        let triplet = piece("C", "(3CDE\n");
        assert_approx_eq!(triplet.duration(), 2.0);
        assert_approx_eq!(triplet.notes()[0].duration(), 2.0 / 3.0);

        assert_approx_eq!(piece("C", "(2C2D2\n").duration(), 6.0);
        assert_approx_eq!(piece("C", "(4C D E F\n").duration(), 3.0);
    }

    #[test]
    fn test_tuplets_repeat_with_their_timing() {
        let music = piece("C", "|: (3CDE :|\n");
        assert_eq!(music.notes().len(), 6);
        assert_approx_eq!(music.duration(), 4.0);
    }

    #[test]
    fn test_chords_and_rests() {
        let music = piece("C", "[C2E2G2] z/ [C2E]\n");
        assert_eq!(midi(&music), vec![60, 64, 67, 60, 64]);
        assert_approx_eq!(music.duration(), 4.5);
    }

    #[test]
    fn test_lyrics_skip_rests_and_bind_chords() {
        let music = piece("C", "[CE] z D E|\nw: la di da\n");
        let words: Vec<_> = music.syllables().iter().map(|s| s.text()).collect();
        assert_eq!(words, vec!["la", "di", "da"]);
        assert!(music.syllables().iter().all(|s| s.voice() == DEFAULT_VOICE));
    }

    #[test]
    fn test_lyrics_cover_replayed_notes() {
        let music = piece("C", "|: C D :|\nw: one two three four\n");
        let words: Vec<_> = music.syllables().iter().map(|s| s.text()).collect();
        assert_eq!(words, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_voices_overlay() {
        let music = piece("C", "V:upper\nC D E F|\nV:lower\nC,4|\nV:upper\nG4|\nw: hold\n");
        assert_approx_eq!(music.duration(), 8.0);
        assert_eq!(midi(&music), vec![60, 62, 64, 65, 67, 48]);
        assert_eq!(music.syllables()[0].voice(), "upper");
    }

    #[test]
    fn test_repeat_state_survives_voice_switch() {
        let music = piece("C", "V:1\n|: C D\nV:2\nz4\nV:1\nE :|\n");
        assert_eq!(midi(&music), vec![60, 62, 64, 60, 62, 64]);
    }

    #[test]
    fn test_very_long_line() {
        let body = format!("{}\nw:{}\n", "C D E F | ".repeat(5000), "la ".repeat(20000));
        let music = piece("C", &body);
        assert_approx_eq!(music.duration(), 20000.0);
        assert_eq!(music.notes().len(), 20000);
        assert_eq!(music.syllables().len(), 20000);
    }

    #[test]
    fn test_invalid_length_is_rejected() {
        let err = compile("X:1\nT:t\nK:C\nC/0 D\n").unwrap_err();
        assert!(matches!(err, KaraokeError::InvalidFieldValue { .. }));
    }

    #[test]
    fn test_body_voices_in_order() {
        let tree = crate::grammar::parse::<crate::grammar::BodyGrammar>(
            BodySymbol::Body,
            "V:b\nC|\nV:a\nD|\nV:b\nE|\n",
        )
        .unwrap();
        assert_eq!(body_voices(&tree).unwrap(), vec!["b", "a", "b"]);
    }
}
