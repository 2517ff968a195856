//! # Key Signatures and Pitch Spelling
//!
//! Note letters, accidentals, and key signatures with the sharps or flats they
//! imply.
//!
//! ## Key Concepts
//! - A key is stored as a count of fifths: positive for sharps, negative for flats
//! - Sharps are added in the order F C G D A E B
//! - Flats are added in the order B E A D G C F
//! - A minor key shares its signature with its relative major (`Am` = `C`)
//!
//! ## Example
//! ```rust
//! use karaoke::key::{Accidental, KeySignature, NoteName};
//!
//! let key = KeySignature::from_str("D").unwrap();
//! assert_eq!(key.accidental_for_note(NoteName::F), Accidental::Sharp);
//! assert_eq!(key.accidental_for_note(NoteName::C), Accidental::Sharp);
//! assert_eq!(key.accidental_for_note(NoteName::G), Accidental::Natural);
//! ```

use serde::Serialize;
use std::fmt;

/// Note letter, A-G.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    /// Accepts either case; lowercase only changes the octave, handled elsewhere.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    /// Semitones above C within one octave.
    pub fn semitones_above_c(&self) -> i16 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    #[default]
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Parse the body notation: `^^`, `^`, `=`, `_`, `__`.
    pub fn from_abc(s: &str) -> Option<Self> {
        match s {
            "^^" => Some(Accidental::DoubleSharp),
            "^" => Some(Accidental::Sharp),
            "=" => Some(Accidental::Natural),
            "_" => Some(Accidental::Flat),
            "__" => Some(Accidental::DoubleFlat),
            _ => None,
        }
    }

    pub fn semitones(&self) -> i16 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

/// Key signature as a count of fifths, -7 (seven flats) to +7 (seven sharps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySignature {
    pub fifths: i8,
    pub mode: Mode,
}

const SHARP_ORDER: [NoteName; 7] = [
    NoteName::F,
    NoteName::C,
    NoteName::G,
    NoteName::D,
    NoteName::A,
    NoteName::E,
    NoteName::B,
];

const FLAT_ORDER: [NoteName; 7] = [
    NoteName::B,
    NoteName::E,
    NoteName::A,
    NoteName::D,
    NoteName::G,
    NoteName::C,
    NoteName::F,
];

impl KeySignature {
    /// Parse key text such as `G`, `Bb`, `F#m` or `Ebm`.
    pub fn from_str(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if let Some(tonic) = trimmed.strip_suffix('m') {
            let fifths = match tonic {
                "A" => 0,
                "E" => 1,
                "B" => 2,
                "F#" => 3,
                "C#" => 4,
                "G#" => 5,
                "D#" => 6,
                "A#" => 7,
                "D" => -1,
                "G" => -2,
                "C" => -3,
                "F" => -4,
                "Bb" => -5,
                "Eb" => -6,
                "Ab" => -7,
                _ => return None,
            };
            return Some(Self {
                fifths,
                mode: Mode::Minor,
            });
        }

        let fifths = match trimmed {
            "C" => 0,
            "G" => 1,
            "D" => 2,
            "A" => 3,
            "E" => 4,
            "B" => 5,
            "F#" => 6,
            "C#" => 7,
            "F" => -1,
            "Bb" => -2,
            "Eb" => -3,
            "Ab" => -4,
            "Db" => -5,
            "Gb" => -6,
            "Cb" => -7,
            _ => return None,
        };
        Some(Self {
            fifths,
            mode: Mode::Major,
        })
    }

    /// The accidental this key applies to an unmarked `note`.
    pub fn accidental_for_note(&self, note: NoteName) -> Accidental {
        let count = self.fifths.unsigned_abs() as usize;
        if self.fifths > 0 && SHARP_ORDER[..count].contains(&note) {
            Accidental::Sharp
        } else if self.fifths < 0 && FLAT_ORDER[..count].contains(&note) {
            Accidental::Flat
        } else {
            Accidental::Natural
        }
    }
}
