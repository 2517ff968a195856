//! Lyric syllables: a character span into one rendered lyric line.

use std::fmt;
use std::sync::Arc;

/// A half-open span `[begin, end)` of characters in a rendered lyric line,
/// sung by one voice.
///
/// An empty span marks a note that consumes a lyric slot without showing
/// anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Syllable {
    voice: Arc<str>,
    line: Arc<str>,
    begin: usize,
    end: usize,
}

impl Syllable {
    pub fn new(voice: Arc<str>, line: Arc<str>, begin: usize, end: usize) -> Self {
        Self {
            voice,
            line,
            begin,
            end: end.max(begin),
        }
    }

    /// The 0/0 "no lyric" marker.
    pub fn skipped(voice: Arc<str>, line: Arc<str>) -> Self {
        Self::new(voice, line, 0, 0)
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// The whole rendered lyric line this syllable points into.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_skipped(&self) -> bool {
        self.begin == self.end
    }

    /// The characters covered by the span.
    pub fn text(&self) -> String {
        self.line
            .chars()
            .skip(self.begin)
            .take(self.end - self.begin)
            .collect()
    }

    /// The lyric line with the span wrapped in `*`, e.g. `*A*mazing grace`.
    pub fn highlighted(&self) -> String {
        let mut out = String::with_capacity(self.line.len() + 2);
        for (i, c) in self.line.chars().enumerate() {
            if i == self.begin {
                out.push('*');
            }
            out.push(c);
            if i + 1 == self.end {
                out.push('*');
            }
        }
        out
    }
}

impl fmt::Display for Syllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}
