//! # Lyric Alignment
//!
//! Renders a `w:` line to display text and splits it into the syllable spans
//! that are bound, one per note, to the music line above it.
//!
//! ## Token Table
//! | token    | rendered | effect                                              |
//! |----------|----------|-----------------------------------------------------|
//! | text     | itself   | new syllable, or extends the previous one if joined |
//! | space    | ` `      | ends any join                                       |
//! | `~`      | ` `      | joins the next text to the previous syllable        |
//! | `\-`     | `-`      | same as `~`                                         |
//! | `-`      | nothing  | after a space or `-`, repeats the previous syllable |
//! | `_`      | nothing  | held note, no syllable                              |
//! | `*`      | nothing  | repeats the previous syllable                       |
//! | `|`      | nothing  | no syllable; a `-` right after it is not free-standing |
//!
//! Spans are character offsets into the rendered line.
//!
//! ## Example
//! ```rust
//! use karaoke::lyrics::{align, tokenize};
//! use karaoke::grammar::{parse, BodyGrammar, BodySymbol};
//!
//! let tree = parse::<BodyGrammar>(BodySymbol::Lyric, "w:A-ma-zing_ grace").unwrap();
//! let syllables = align("unknown", &tokenize(&tree));
//! let shown: Vec<_> = syllables.iter().map(|s| s.highlighted()).collect();
//! assert_eq!(shown, ["*A*mazing grace", "A*ma*zing grace", "Ama*zing* grace", "Amazing *grace*"]);
//! ```

use crate::grammar::{BodySymbol, ParseTree};
use crate::music::Syllable;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricToken {
    Text(String),
    Space,
    Hyphen,
    Hold,
    Skip,
    Tilde,
    EscapedHyphen,
    Bar,
}

/// Tokens of a tree rooted at [`BodySymbol::Lyric`], in source order.
pub fn tokenize(lyric: &ParseTree<BodySymbol>) -> Vec<LyricToken> {
    lyric
        .children()
        .iter()
        .filter_map(|token| match token.symbol() {
            BodySymbol::LyricText => Some(LyricToken::Text(token.text().to_string())),
            BodySymbol::LyricSpace => Some(LyricToken::Space),
            BodySymbol::LyricHyphen => Some(LyricToken::Hyphen),
            BodySymbol::LyricHold => Some(LyricToken::Hold),
            BodySymbol::LyricSkip => Some(LyricToken::Skip),
            BodySymbol::LyricTilde => Some(LyricToken::Tilde),
            BodySymbol::LyricEscapedHyphen => Some(LyricToken::EscapedHyphen),
            BodySymbol::LyricBar => Some(LyricToken::Bar),
            _ => None,
        })
        .collect()
}

/// The display text of a lyric line.
pub fn render(tokens: &[LyricToken]) -> String {
    let mut line = String::new();
    for token in tokens {
        match token {
            LyricToken::Text(text) => line.push_str(text),
            LyricToken::Space | LyricToken::Tilde => line.push(' '),
            LyricToken::EscapedHyphen => line.push('-'),
            LyricToken::Hyphen | LyricToken::Hold | LyricToken::Skip | LyricToken::Bar => {}
        }
    }
    line
}

/// Syllables of one lyric line sung by `voice`, in binding order.
pub fn align(voice: &str, tokens: &[LyricToken]) -> Vec<Syllable> {
    let voice: Arc<str> = Arc::from(voice);
    let line: Arc<str> = Arc::from(render(tokens));

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut cursor = 0;
    let mut joined = false;
    let mut previous: Option<&LyricToken> = None;

    for token in tokens {
        match token {
            LyricToken::Text(text) => {
                let end = cursor + text.chars().count();
                match spans.last_mut() {
                    Some(last) if joined => last.1 = end,
                    _ => spans.push((cursor, end)),
                }
                cursor = end;
                joined = false;
            }
            LyricToken::Space => {
                cursor += 1;
                joined = false;
            }
            LyricToken::Tilde | LyricToken::EscapedHyphen => {
                cursor += 1;
                joined = true;
            }
            LyricToken::Hyphen => {
                if matches!(previous, Some(LyricToken::Hyphen | LyricToken::Space)) {
                    spans.push(spans.last().copied().unwrap_or((0, 0)));
                }
            }
            LyricToken::Skip => spans.push(spans.last().copied().unwrap_or((0, 0))),
            LyricToken::Hold | LyricToken::Bar => {}
        }
        previous = Some(token);
    }

    spans
        .into_iter()
        .map(|(begin, end)| Syllable::new(Arc::clone(&voice), Arc::clone(&line), begin, end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{parse, BodyGrammar};

    fn syllables(lyric: &str) -> Vec<(usize, usize)> {
        let tree = parse::<BodyGrammar>(BodySymbol::Lyric, lyric).unwrap();
        align("v", &tokenize(&tree))
            .iter()
            .map(|s| (s.begin(), s.end()))
            .collect()
    }

    fn rendered(lyric: &str) -> String {
        let tree = parse::<BodyGrammar>(BodySymbol::Lyric, lyric).unwrap();
        render(&tokenize(&tree))
    }

    #[test]
    fn test_hyphenated_words() {
        assert_eq!(rendered("w:A-ma-zing_ grace"), "Amazing grace");
        assert_eq!(syllables("w:A-ma-zing_ grace"), vec![(0, 1), (1, 3), (3, 7), (8, 13)]);
    }

    #[test]
    fn test_skip_repeats_previous_span() {
        assert_eq!(syllables("w:la * la"), vec![(0, 2), (0, 2), (4, 6)]);
    }

    #[test]
    fn test_free_standing_hyphen() {
        // "- " after a space and "--" both repeat; a word-internal "-" does not.
        assert_eq!(syllables("w:oh - yes"), vec![(0, 2), (0, 2), (4, 7)]);
        assert_eq!(syllables("w:a--b"), vec![(0, 1), (0, 1), (1, 2)]);
    }

    #[test]
    fn test_joins_extend_previous() {
        assert_eq!(rendered("w:of~the night"), "of the night");
        assert_eq!(syllables("w:of~the night"), vec![(0, 6), (7, 12)]);
        assert_eq!(rendered("w:well\\-known"), "well-known");
        assert_eq!(syllables("w:well\\-known"), vec![(0, 10)]);
    }

    #[test]
    fn test_space_cancels_join() {
        assert_eq!(syllables("w:a~ b"), vec![(0, 1), (3, 4)]);
    }

    #[test]
    fn test_bars_emit_no_syllable() {
        assert_eq!(rendered("w:one | two"), "one  two");
        assert_eq!(syllables("w:one | two"), vec![(0, 3), (5, 8)]);
        assert_eq!(syllables("w:a |- b"), vec![(0, 1), (3, 4)]);
        assert_eq!(syllables("w:a | - b"), vec![(0, 1), (0, 1), (4, 5)]);
    }

    #[test]
    fn test_leading_skip_is_empty() {
        let tree = parse::<BodyGrammar>(BodySymbol::Lyric, "w:* go").unwrap();
        let result = align("v", &tokenize(&tree));
        assert_eq!(result.len(), 2);
        assert!(result[0].is_skipped());
        assert_eq!(result[1].text(), "go");
    }

    #[test]
    fn test_empty_lyric_line() {
        assert!(syllables("w:").is_empty());
    }
}
