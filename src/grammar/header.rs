//! Header grammar: `X:` index, comments, `T:` title, optional `C:`/`L:`/`M:`/`Q:`/`V:`
//! fields in any order, then `K:` key. Everything after the key line is
//! captured unparsed as [`HeaderSymbol::Music`].

use super::{Cursor, Grammar, ParseTree};

type Tree = ParseTree<HeaderSymbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderSymbol {
    Header,
    FieldNumber,
    FieldTitle,
    OtherField,
    FieldComposer,
    FieldDefaultLength,
    FieldMeter,
    FieldTempo,
    FieldVoice,
    FieldKey,
    /// `n/m`, both parts mandatory.
    Fraction,
    Meter,
    /// `C`, common time.
    CommonTime,
    /// `C|`, cut time.
    CutTime,
    Tempo,
    Key,
    KeyNote,
    KeyAccidental,
    MinorMode,
    BaseNote,
    Digits,
    Text,
    Comment,
    EndOfLine,
    Newline,
    Music,
}

pub struct HeaderGrammar;

impl Grammar for HeaderGrammar {
    type Symbol = HeaderSymbol;

    const ROOT: HeaderSymbol = HeaderSymbol::Header;

    fn rule(symbol: HeaderSymbol, c: &mut Cursor<'_>) -> Option<Tree> {
        use HeaderSymbol::*;
        match symbol {
            Header => header(c),
            FieldNumber => field(c, FieldNumber, "X:", digits),
            FieldTitle => field(c, FieldTitle, "T:", text),
            OtherField => other_field(c),
            FieldComposer => field(c, FieldComposer, "C:", text),
            FieldDefaultLength => field(c, FieldDefaultLength, "L:", fraction),
            FieldMeter => field(c, FieldMeter, "M:", meter),
            FieldTempo => field(c, FieldTempo, "Q:", tempo),
            FieldVoice => field(c, FieldVoice, "V:", text),
            FieldKey => field(c, FieldKey, "K:", key),
            Fraction => fraction(c),
            Meter => meter(c),
            CommonTime => c.terminal(CommonTime, "C"),
            CutTime => c.terminal(CutTime, "C|"),
            Tempo => tempo(c),
            Key => key(c),
            KeyNote => key_note(c),
            KeyAccidental => key_accidental(c),
            MinorMode => c.terminal(MinorMode, "m"),
            BaseNote => base_note(c),
            Digits => digits(c),
            Text => text(c),
            Comment => comment(c),
            EndOfLine => end_of_line(c),
            Newline => newline(c),
            Music => music(c),
        }
    }
}

fn header(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let mut children = vec![HeaderGrammar::rule(HeaderSymbol::FieldNumber, c)?];
    while let Some(comment) = c.attempt(comment) {
        children.push(comment);
    }
    children.push(field(c, HeaderSymbol::FieldTitle, "T:", text)?);
    while let Some(other) = c.attempt(other_field) {
        children.push(other);
    }
    children.push(field(c, HeaderSymbol::FieldKey, "K:", key)?);
    children.push(music(c)?);
    Some(c.node(HeaderSymbol::Header, start, children))
}

/// `prefix` spaces* value end-of-line
fn field(
    c: &mut Cursor<'_>,
    symbol: HeaderSymbol,
    prefix: &'static str,
    value: fn(&mut Cursor<'_>) -> Option<Tree>,
) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        if !c.eat(prefix) {
            c.fail(prefix);
            return None;
        }
        c.eat_while(is_space_or_tab);
        let value = value(c)?;
        let eol = end_of_line(c)?;
        Some(c.node(symbol, start, vec![value, eol]))
    })
}

fn other_field(c: &mut Cursor<'_>) -> Option<Tree> {
    use HeaderSymbol::*;
    let start = c.mark();
    let inner = c
        .attempt(|c| field(c, FieldComposer, "C:", text))
        .or_else(|| c.attempt(|c| field(c, FieldDefaultLength, "L:", fraction)))
        .or_else(|| c.attempt(|c| field(c, FieldMeter, "M:", meter)))
        .or_else(|| c.attempt(|c| field(c, FieldTempo, "Q:", tempo)))
        .or_else(|| c.attempt(|c| field(c, FieldVoice, "V:", text)))
        .or_else(|| c.attempt(comment))?;
    Some(c.node(OtherField, start, vec![inner]))
}

fn fraction(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let numerator = digits(c)?;
        if !c.eat("/") {
            c.fail("/");
            return None;
        }
        let denominator = digits(c)?;
        Some(c.node(HeaderSymbol::Fraction, start, vec![numerator, denominator]))
    })
}

fn meter(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    let inner = c
        .attempt(|c| c.terminal(HeaderSymbol::CutTime, "C|"))
        .or_else(|| c.attempt(|c| c.terminal(HeaderSymbol::CommonTime, "C")))
        .or_else(|| c.attempt(fraction))?;
    Some(c.node(HeaderSymbol::Meter, start, vec![inner]))
}

/// `1/4=120`, or a bare `120` counted in the default note length.
fn tempo(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let mut children = Vec::new();
        if let Some(length) = c.attempt(|c| {
            let length = fraction(c)?;
            if c.eat("=") {
                Some(length)
            } else {
                c.fail("=");
                None
            }
        }) {
            children.push(length);
        }
        children.push(digits(c)?);
        Some(c.node(HeaderSymbol::Tempo, start, children))
    })
}

fn key(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let mut children = vec![key_note(c)?];
        if let Some(minor) = c.attempt(|c| c.terminal(HeaderSymbol::MinorMode, "m")) {
            children.push(minor);
        }
        Some(c.node(HeaderSymbol::Key, start, children))
    })
}

fn key_note(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        let mut children = vec![base_note(c)?];
        if let Some(accidental) = c.attempt(key_accidental) {
            children.push(accidental);
        }
        Some(c.node(HeaderSymbol::KeyNote, start, children))
    })
}

fn key_accidental(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat_if(|ch| ch == '#' || ch == 'b').is_some() {
        Some(c.node(HeaderSymbol::KeyAccidental, start, Vec::new()))
    } else {
        c.fail("# or b");
        None
    }
}

fn base_note(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat_if(|ch| ('A'..='G').contains(&ch)).is_some() {
        Some(c.node(HeaderSymbol::BaseNote, start, Vec::new()))
    } else {
        c.fail("key note A-G");
        None
    }
}

fn digits(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat_while(|ch| ch.is_ascii_digit()) > 0 {
        Some(c.node(HeaderSymbol::Digits, start, Vec::new()))
    } else {
        c.fail("digits");
        None
    }
}

/// Free text up to a comment or line break. May be empty.
fn text(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    c.eat_while(|ch| ch != '\n' && ch != '\r' && ch != '%');
    Some(c.node(HeaderSymbol::Text, start, Vec::new()))
}

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
        Some(c.node(HeaderSymbol::Comment, start, children))
    })
}

/// Trailing spaces, then a comment, a line break, or the end of input.
fn end_of_line(c: &mut Cursor<'_>) -> Option<Tree> {
    c.attempt(|c| {
        let start = c.mark();
        if let Some(comment) = c.attempt(comment) {
            return Some(c.node(HeaderSymbol::EndOfLine, start, vec![comment]));
        }
        c.eat_while(is_space_or_tab);
        if c.at_end() {
            return Some(c.node(HeaderSymbol::EndOfLine, start, Vec::new()));
        }
        let newline = newline(c)?;
        Some(c.node(HeaderSymbol::EndOfLine, start, vec![newline]))
    })
}

fn newline(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    if c.eat("\r\n") || c.eat("\n") {
        Some(c.node(HeaderSymbol::Newline, start, Vec::new()))
    } else {
        c.fail("end of line");
        None
    }
}

fn music(c: &mut Cursor<'_>) -> Option<Tree> {
    let start = c.mark();
    while c.advance().is_some() {}
    Some(c.node(HeaderSymbol::Music, start, Vec::new()))
}

fn is_space_or_tab(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}
