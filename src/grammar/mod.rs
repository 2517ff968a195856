//! # Grammar Module
//!
//! Recursive-descent parsing of the two text grammars into labeled parse trees.
//!
//! ## Purpose
//! A piece is parsed in two stages. The header grammar consumes the `X:` … `K:`
//! fields and hands back everything after the key field verbatim; the body
//! grammar then parses that remainder into lines of musical elements, voice
//! switches, comments and aligned lyric lines.
//!
//! Both grammars produce the same generic [`ParseTree`]: a symbol tag, the
//! matched source text, the position it started at, and ordered children. The
//! trees carry no interpretation; the header interpreter and AST builder walk
//! them.
//!
//! ## Sub-modules
//! - `header` - [`HeaderGrammar`] and its [`HeaderSymbol`]s
//! - `body` - [`BodyGrammar`] and its [`BodySymbol`]s
//!
//! ## Error Reporting
//! Rules backtrack freely. Every failed terminal records what it expected at
//! its position, and the overall error reports the furthest position reached
//! together with everything expected there.
//!
//! ## Example
//! ```rust
//! use karaoke::grammar::{parse, BodyGrammar, BodySymbol};
//!
//! let tree = parse::<BodyGrammar>(BodySymbol::Note, "^c'3/4").unwrap();
//! assert_eq!(tree.symbol(), BodySymbol::Note);
//! assert_eq!(tree.text(), "^c'3/4");
//! assert!(tree.child(BodySymbol::NoteLength).is_some());
//! ```

mod body;
mod header;

pub(crate) use body::tuplet_size;
pub use body::{BodyGrammar, BodySymbol};
pub use header::{HeaderGrammar, HeaderSymbol};

use crate::error::KaraokeError;
use std::fmt;

/// A node of a parse tree: symbol, matched text, start position, children.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree<S> {
    symbol: S,
    text: String,
    line: usize,
    column: usize,
    children: Vec<ParseTree<S>>,
}

impl<S: Copy + PartialEq> ParseTree<S> {
    pub fn symbol(&self) -> S {
        self.symbol
    }

    /// The exact source text this node matched.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-indexed line of the first matched character.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-indexed column of the first matched character.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn children(&self) -> &[ParseTree<S>] {
        &self.children
    }

    /// First direct child tagged with `symbol`.
    pub fn child(&self, symbol: S) -> Option<&ParseTree<S>> {
        self.children.iter().find(|c| c.symbol == symbol)
    }

    /// All direct children tagged with `symbol`, in source order.
    pub fn children_of(&self, symbol: S) -> impl Iterator<Item = &ParseTree<S>> {
        self.children.iter().filter(move |c| c.symbol == symbol)
    }
}

/// A grammar compiled into rule functions.
///
/// `rule` dispatches a symbol to the routine that recognizes it, so any symbol
/// may serve as the root of a parse. A rule returns `None` when it does not
/// match; the cursor position is then unspecified and callers restore it via
/// [`Cursor::attempt`].
pub trait Grammar {
    type Symbol: Copy + Eq + fmt::Debug;

    /// The symbol that recognizes a complete document.
    const ROOT: Self::Symbol;

    fn rule(symbol: Self::Symbol, cursor: &mut Cursor<'_>) -> Option<ParseTree<Self::Symbol>>;
}

/// Parse `text` with `root` as the start symbol. The whole input must match.
pub fn parse<G: Grammar>(root: G::Symbol, text: &str) -> Result<ParseTree<G::Symbol>, KaraokeError> {
    parse_from_line::<G>(root, text, 1)
}

/// Like [`parse`], but positions are reported as if `text` began on `first_line`.
///
/// The body text handed back by the header grammar starts partway through the
/// file; this keeps body errors pointing at the right file line.
pub fn parse_from_line<G: Grammar>(
    root: G::Symbol,
    text: &str,
    first_line: usize,
) -> Result<ParseTree<G::Symbol>, KaraokeError> {
    let mut cursor = Cursor::with_origin(text, first_line);
    let tree = cursor.attempt(|c| G::rule(root, c));
    match tree {
        Some(tree) if cursor.at_end() => Ok(tree),
        Some(_) => {
            cursor.fail("end of input");
            Err(cursor.error())
        }
        None => Err(cursor.error()),
    }
}

/// Saved cursor position for backtracking.
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    position: usize,
    line: usize,
    column: usize,
}

#[derive(Debug)]
struct Failure {
    mark: Mark,
    expected: Vec<&'static str>,
}

/// Character cursor over the input with line/column tracking.
pub struct Cursor<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    furthest: Option<Failure>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_origin(input, 1)
    }

    fn with_origin(input: &'a str, first_line: usize) -> Self {
        Self {
            input,
            position: 0,
            line: first_line,
            column: 1,
            furthest: None,
        }
    }

    pub fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    pub fn reset(&mut self, mark: Mark) {
        self.position = mark.position;
        self.line = mark.line;
        self.column = mark.column;
    }

    /// Run `f`, rewinding to the current position if it does not match.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let mark = self.mark();
        let result = f(self);
        if result.is_none() {
            self.reset(mark);
        }
        result
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.position..]
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume `literal` if the input continues with it.
    pub fn eat(&mut self, literal: &str) -> bool {
        if self.remaining().starts_with(literal) {
            for _ in literal.chars() {
                self.advance();
            }
            true
        } else {
            false
        }
    }

    /// Consume one character satisfying `pred`.
    pub fn eat_if(&mut self, pred: impl Fn(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(c) if pred(c) => self.advance(),
            _ => None,
        }
    }

    /// Consume characters while `pred` holds; returns how many were consumed.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.eat_if(&pred).is_some() {
            count += 1;
        }
        count
    }

    /// Record that `expected` was wanted at the current position.
    pub fn fail(&mut self, expected: &'static str) {
        let here = self.mark();
        match &mut self.furthest {
            Some(f) if f.mark.position > here.position => {}
            Some(f) if f.mark.position == here.position => {
                if !f.expected.contains(&expected) {
                    f.expected.push(expected);
                }
            }
            _ => {
                self.furthest = Some(Failure {
                    mark: here,
                    expected: vec![expected],
                })
            }
        }
    }

    /// Match a literal as a leaf node, recording a failure otherwise.
    pub fn terminal<S>(&mut self, symbol: S, literal: &'static str) -> Option<ParseTree<S>> {
        let start = self.mark();
        if self.eat(literal) {
            Some(self.node(symbol, start, Vec::new()))
        } else {
            self.fail(literal);
            None
        }
    }

    /// Build a node spanning from `start` to the current position.
    pub fn node<S>(&self, symbol: S, start: Mark, children: Vec<ParseTree<S>>) -> ParseTree<S> {
        ParseTree {
            symbol,
            text: self.input[start.position..self.position].to_string(),
            line: start.line,
            column: start.column,
            children,
        }
    }

    fn error(&self) -> KaraokeError {
        match &self.furthest {
            Some(f) => KaraokeError::Parse {
                line: f.mark.line,
                column: f.mark.column,
                expected: f.expected.join(" or "),
            },
            None => KaraokeError::Parse {
                line: self.line,
                column: self.column,
                expected: "valid input".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        assert_eq!(cursor.advance(), Some('a'));
        assert_eq!(cursor.advance(), Some('b'));
        assert_eq!(cursor.advance(), Some('\n'));
        let mark = cursor.mark();
        assert_eq!((mark.line, mark.column), (2, 1));
        assert!(cursor.eat("cd"));
        assert!(cursor.at_end());
    }

    #[test]
    fn test_attempt_rewinds_on_failure() {
        let mut cursor = Cursor::new("xyz");
        let result: Option<()> = cursor.attempt(|c| {
            c.advance();
            c.advance();
            None
        });
        assert!(result.is_none());
        assert_eq!(cursor.peek(), Some('x'));
    }

    #[test]
    fn test_furthest_failure_wins() {
        let mut cursor = Cursor::new("abc");
        cursor.fail("a");
        cursor.advance();
        cursor.fail("b");
        cursor.fail("c");
        cursor.reset(Cursor::new("abc").mark());
        cursor.fail("ignored");
        match cursor.error() {
            KaraokeError::Parse { line, column, expected } => {
                assert_eq!((line, column), (1, 2));
                assert_eq!(expected, "b or c");
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_reports_trailing_input() {
        let err = parse::<BodyGrammar>(BodySymbol::Note, "C D").unwrap_err();
        match err {
            KaraokeError::Parse { column, expected, .. } => {
                assert_eq!(column, 2);
                assert!(expected.contains("end of input"));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_from_line_offsets_errors() {
        let err = parse_from_line::<BodyGrammar>(BodySymbol::Body, "C D\nQ\n", 7).unwrap_err();
        match err {
            KaraokeError::Parse { line, column, .. } => assert_eq!((line, column), (8, 1)),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }
}
