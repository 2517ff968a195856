//! Body grammar: lines of notes, rests, chords, tuplets, barlines and repeat
//! markers, with optional `w:` lyric lines, mid-body `V:` voice switches and
//! `%` comments.

use super::{Cursor, Grammar, ParseTree};

type Tree = ParseTree<BodySymbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodySymbol {
    Body,
    /// One music line, optionally followed by its lyric line.
    MusicLine,
    /// A blank line.
    BlankLine,
    Element,
    NoteElement,
    Note,
    Pitch,
    Accidental,
    BaseNote,
    Octave,
    NoteLength,
    Rest,
    Tuplet,
    TupletSpec,
    Chord,
    Barline,
    /// `[1` or `[2`.
    NthRepeat,
    FieldVoice,
    Text,
    Lyric,
    LyricText,
    LyricSpace,
    /// `-` syllable break.
    LyricHyphen,
    /// `_` hold.
    LyricHold,
    /// `*` skip.
    LyricSkip,
    /// `~` join.
    LyricTilde,
    /// `\-` join.
    LyricEscapedHyphen,
    /// `|` bar marker inside a lyric line.
    LyricBar,
    Comment,
    SpaceOrTab,
    EndOfLine,
    Newline,
    Digits,
}

pub struct BodyGrammar;

impl Grammar for BodyGrammar {
    type Symbol = BodySymbol;

    const ROOT: BodySymbol = BodySymbol::Body;

    fn rule(symbol: BodySymbol, c: &mut Cursor<'_>) -> Option<Tree> {
        use BodySymbol::*;
        match symbol {
            Body => body(c),
            MusicLine => music_line(c),
            BlankLine => blank_line(c),
            Element => element(c),
            NoteElement => note_element(c),
            Note => note(c),
            Pitch => pitch(c),
            Accidental => accidental(c),
            BaseNote => base_note(c),
            Octave => octave(c),
            NoteLength => note_length(c),
            Rest => rest(c),
            Tuplet => tuplet(c),
            TupletSpec => tuplet_spec(c),
            Chord => chord(c),
            Barline => barline(c),
            NthRepeat => nth_repeat(c),
            FieldVoice => field_voice(c),
            Text => text(c),
            Lyric => lyric(c),
            LyricText => lyric_text(c),
            LyricSpace | LyricHyphen | LyricHold | LyricSkip | LyricTilde | LyricEscapedHyphen
            | LyricBar => lyric_token(c).filter(|t| t.symbol() == symbol),
            Comment => comment(c),
            SpaceOrTab => space_or_tab(c),
            EndOfLine => end_of_line(c),
            Newline => newline(c),
            Digits => digits(c),
        }
    }
}

fn body(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let mut lines = Vec::new();
    while !c.at_end() {
        let line = c
            .attempt(field_voice)
            .or_else(|| c.attempt(comment))
            .or_else(|| c.attempt(blank_line))
            .or_else(|| c.attempt(music_line));
        match line {
            Some(line) => lines.push(line),
            None => break,
        }
    }
    if lines.is_empty() {
        c.fail("a line of music");
        return None;
    }
    Some(c.node(BodySymbol::Body, start, lines))
}

/// element+ end-of-line, then optionally `w:` lyric end-of-line.
fn music_line(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let mut children = Vec::new();
        while let Some(element) = c.attempt(element) {
            children.push(element);
        }
        if children.is_empty() {
            return None;
        }
        children.push(end_of_line(c)?);
        if let Some(lyric) = c.attempt(|c| {
            let lyric = lyric(c)?;
            let eol = end_of_line(c)?;
            Some((lyric, eol))
        }) {
            children.push(lyric.0);
            children.push(lyric.1);
        }
        Some(c.node(BodySymbol::MusicLine, start, children))
    })
}

fn blank_line(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let newline = newline(c)?;
    Some(c.node(BodySymbol::BlankLine, start, vec![newline]))
}

fn element(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let inner = c
        .attempt(tuplet)
        .or_else(|| c.attempt(nth_repeat))
        .or_else(|| c.attempt(barline))
        .or_else(|| c.attempt(note_element))
        .or_else(|| c.attempt(rest))
        .or_else(|| c.attempt(space_or_tab))?;
    Some(c.node(BodySymbol::Element, start, vec![inner]))
}

fn note_element(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let inner = c.attempt(note).or_else(|| c.attempt(chord))?;
    Some(c.node(BodySymbol::NoteElement, start, vec![inner]))
}

/// pitch note-length?
fn note(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let mut children = vec![pitch(c)?];
        if let Some(length) = c.attempt(note_length) {
            children.push(length);
        }
        Some(c.node(BodySymbol::Note, start, children))
    })
}

/// accidental? basenote octave?
fn pitch(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let mut children = Vec::new();
        if let Some(accidental) = c.attempt(accidental) {
            children.push(accidental);
        }
        children.push(base_note(c)?);
        if let Some(octave) = c.attempt(octave) {
            children.push(octave);
        }
        Some(c.node(BodySymbol::Pitch, start, children))
    })
}

fn accidental(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let matched = ["^^", "__", "^", "_", "="].iter().any(|a| c.eat(a));
    if matched {
        Some(c.node(BodySymbol::Accidental, start, Vec::new()))
    } else {
        c.fail("accidental");
        None
    }
}

fn base_note(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let is_note = |ch: char| matches!(ch.to_ascii_uppercase(), 'A'..='G');
    if c.eat_if(is_note).is_some() {
        Some(c.node(BodySymbol::BaseNote, start, Vec::new()))
    } else {
        c.fail("note");
        None
    }
}

/// One or more `'`, or one or more `,`.
fn octave(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat_while(|ch| ch == '\'') > 0 || c.eat_while(|ch| ch == ',') > 0 {
        Some(c.node(BodySymbol::Octave, start, Vec::new()))
    } else {
        None
    }
}

/// digits? (`/` digits?)?, non-empty.
fn note_length(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let mut children = Vec::new();
    if let Some(numerator) = c.attempt(digits) {
        children.push(numerator);
    }
    let slash = c.eat("/");
    if slash {
        if let Some(denominator) = c.attempt(digits) {
            children.push(denominator);
        }
    }
    if children.is_empty() && !slash {
        return None;
    }
    Some(c.node(BodySymbol::NoteLength, start, children))
}

fn rest(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        if !c.eat("z") {
            c.fail("z");
            return None;
        }
        let mut children = Vec::new();
        if let Some(length) = c.attempt(note_length) {
            children.push(length);
        }
        Some(c.node(BodySymbol::Rest, start, children))
    })
}

/// `(n` followed by exactly n note elements, spaces allowed between them.
fn tuplet(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let spec = tuplet_spec(c)?;
        let count = tuplet_size(&spec)?;
        let mut children = vec![spec];
        for _ in 0..count {
            c.eat_while(is_space_or_tab);
            children.push(note_element(c)?);
        }
        Some(c.node(BodySymbol::Tuplet, start, children))
    })
}

fn tuplet_spec(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        if !c.eat("(") {
            c.fail("(");
            return None;
        }
        let size = c.eat_if(|ch| matches!(ch, '2' | '3' | '4'));
        if size.is_none() {
            c.fail("tuplet size 2, 3 or 4");
            return None;
        }
        Some(c.node(BodySymbol::TupletSpec, start, Vec::new()))
    })
}

pub(crate) fn tuplet_size(spec: &Tree) -> Option<usize> {
    spec.text().trim_start_matches('(').parse().ok()
}

/// `[` note (spaces note)* `]`
fn chord(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        if !c.eat("[") {
            c.fail("[");
            return None;
        }
        let mut children = vec![note(c)?];
        loop {
            c.eat_while(is_space_or_tab);
            match c.attempt(note) {
                Some(n) => children.push(n),
                None => break,
            }
        }
        if !c.eat("]") {
            c.fail("]");
            return None;
        }
        Some(c.node(BodySymbol::Chord, start, children))
    })
}

fn barline(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let matched = ["[|", "|]", "||", "|:", ":|", "|"].iter().any(|b| c.eat(b));
    if matched {
        Some(c.node(BodySymbol::Barline, start, Vec::new()))
    } else {
        c.fail("barline");
        None
    }
}

fn nth_repeat(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat("[1") || c.eat("[2") {
        Some(c.node(BodySymbol::NthRepeat, start, Vec::new()))
    } else {
        c.fail("[1 or [2");
        None
    }
}

/// `V:` text end-of-line
fn field_voice(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        if !c.eat("V:") {
            c.fail("V:");
            return None;
        }
        let name = text(c)?;
        let eol = end_of_line(c)?;
        Some(c.node(BodySymbol::FieldVoice, start, vec![name, eol]))
    })
}

fn text(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    c.eat_while(|ch| ch != '\n' && ch != '\r' && ch != '%');
    Some(c.node(BodySymbol::Text, start, Vec::new()))
}

/// `w:` lyrical-element*
fn lyric(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        if !c.eat("w:") {
            c.fail("w:");
            return None;
        }
        let mut children = Vec::new();
        while let Some(token) = c.attempt(lyric_token) {
            children.push(token);
        }
        Some(c.node(BodySymbol::Lyric, start, children))
    })
}

fn lyric_token(c: &mut Cursor<'_>) -> Option<Tree> {
    use BodySymbol::*;
    let start = c.mark();
    if c.eat("\\-") {
        return Some(c.node(LyricEscapedHyphen, start, Vec::new()));
    }
    let symbol = match c.peek()? {
        ' ' | '\t' => LyricSpace,
        '-' => LyricHyphen,
        '_' => LyricHold,
        '*' => LyricSkip,
        '~' => LyricTilde,
        '|' => LyricBar,
        _ => return c.attempt(lyric_text),
    };
    c.advance();
    Some(c.node(symbol, start, Vec::new()))
}

fn lyric_text(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let consumed = c.eat_while(|ch| {
        !matches!(ch, ' ' | '\t' | '-' | '_' | '*' | '~' | '\\' | '|' | '%' | '\n' | '\r')
    });
    if consumed == 0 {
        return None;
    }
    Some(c.node(BodySymbol::LyricText, start, Vec::new()))
}

/// spaces* `%` anything up to and including the line break.
fn comment(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        c.eat_while(is_space_or_tab);
        if !c.eat("%") {
            c.fail("%");
            return None;
        }
        c.eat_while(|ch| ch != '\n' && ch != '\r');
        let mut children = Vec::new();
        if !c.at_end() {
            children.push(newline(c)?);
        }
        Some(c.node(BodySymbol::Comment, start, children))
    })
}

fn space_or_tab(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat_if(is_space_or_tab).is_some() {
        Some(c.node(BodySymbol::SpaceOrTab, start, Vec::new()))
    } else {
        None
    }
}

/// A comment, a line break, or the end of input.
fn end_of_line(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if let Some(comment) = c.attempt(comment) {
        return Some(c.node(BodySymbol::EndOfLine, start, vec![comment]));
    }
    if c.at_end() {
        return Some(c.node(BodySymbol::EndOfLine, start, Vec::new()));
    }
    let newline = newline(c)?;
    Some(c.node(BodySymbol::EndOfLine, start, vec![newline]))
}

fn newline(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat("\r\n") || c.eat("\n") {
        Some(c.node(BodySymbol::Newline, start, Vec::new()))
    } else {
        c.fail("end of line");
        None
    }
}

fn digits(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat_while(|ch| ch.is_ascii_digit()) > 0 {
        Some(c.node(BodySymbol::Digits, start, Vec::new()))
    } else {
        None
    }
}

fn is_space_or_tab(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}
