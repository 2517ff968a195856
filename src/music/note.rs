use super::Syllable;
use crate::error::KaraokeError;
use crate::header::Header;
use crate::key::NoteName;
use crate::playback::Pitch;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A single pitched note.
///
/// `octave` counts octaves above the uppercase letter's octave; `transpose` is
/// the signed accidental in semitones. Length is in note-length units and is
/// scaled by `tuplet` when the note sits inside a tuplet.
#[derive(Debug, Clone)]
pub struct Note {
    letter: NoteName,
    octave: i8,
    transpose: i8,
    length: f64,
    tuplet: f64,
    syllable: Option<Syllable>,
    header: Arc<Header>,
}

impl Note {
    pub fn new(
        letter: NoteName,
        octave: i8,
        transpose: i8,
        length: f64,
        tuplet: f64,
        header: Arc<Header>,
    ) -> Self {
        Self {
            letter,
            octave,
            transpose,
            length,
            tuplet,
            syllable: None,
            header,
        }
    }

    pub fn letter(&self) -> NoteName {
        self.letter
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn transpose(&self) -> i8 {
        self.transpose
    }

    pub fn tuplet(&self) -> f64 {
        self.tuplet
    }

    pub fn pitch(&self) -> Pitch {
        Pitch::new(self.letter).transpose(self.transpose as i16 + 12 * self.octave as i16)
    }

    pub fn duration(&self) -> f64 {
        self.length * self.tuplet
    }

    pub fn syllable(&self) -> Option<&Syllable> {
        self.syllable.as_ref()
    }

    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// A copy of this note carrying `syllable`.
    pub fn with_syllable(&self, syllable: Syllable) -> Self {
        Self {
            syllable: Some(syllable),
            ..self.clone()
        }
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.pitch() == other.pitch() && self.duration() == other.duration()
    }
}

impl Eq for Note {}

impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pitch().hash(state);
        hash_beats(self.duration(), state);
    }
}

/// Hash a beat count consistently with `==` on floats.
pub(crate) fn hash_beats<H: Hasher>(beats: f64, state: &mut H) {
    let normalized = if beats == 0.0 { 0.0 } else { beats };
    normalized.to_bits().hash(state);
}

/// Decode a length token: `""` is 1, `/` is 1/2, `/n` is 1/n, `n/` is n/2,
/// `n/m` is n/m, and a bare number is itself.
///
/// # Example
/// ```
/// use karaoke::music::parse_length;
///
/// assert_eq!(parse_length("3/4").unwrap(), 0.75);
/// assert_eq!(parse_length("3/").unwrap(), 1.5);
/// assert_eq!(parse_length("/").unwrap(), 0.5);
/// assert_eq!(parse_length("").unwrap(), 1.0);
/// ```
pub fn parse_length(token: &str) -> Result<f64, KaraokeError> {
    let number = |s: &str| -> Result<f64, KaraokeError> {
        s.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| KaraokeError::invalid_field("length", token, "not a number"))
    };

    let (numerator, denominator) = match token.split_once('/') {
        None if token.is_empty() => return Ok(1.0),
        None => return number(token),
        Some((n, d)) => (
            if n.is_empty() { 1.0 } else { number(n)? },
            if d.is_empty() { 2.0 } else { number(d)? },
        ),
    };
    if denominator == 0.0 {
        return Err(KaraokeError::invalid_field(
            "length",
            token,
            "denominator must be non-zero",
        ));
    }
    Ok(numerator / denominator)
}
