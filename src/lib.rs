//! # karaoke
//!
//! Compiles ABC-style notation with aligned lyric lines into an immutable,
//! playable [`Music`] tree.
//!
//! ## Pipeline
//! ```text
//! source ─▶ header grammar ─▶ Header + body text
//!                                   │
//!                        body grammar ─▶ AST builder ─▶ Music
//! ```
//!
//! ## Example
//! ```rust
//! let source = "X:1\nT:Amazing Grace\nM:3/4\nL:1/4\nK:G\nD | G2 B/G/ | B2 A |\nw: A-ma-zing grace\n";
//! let piece = karaoke::compile(source).unwrap();
//!
//! assert_eq!(piece.header().title(), "Amazing Grace");
//! assert_eq!(piece.music().notes().len(), 6);
//! let lyrics: Vec<_> = piece.music().syllables().iter().map(|s| s.text()).collect();
//! assert_eq!(lyrics, ["A", "ma", "zing", "grace"]);
//! ```

pub mod broadcast;
pub mod builder;
pub mod config;
pub mod error;
pub mod grammar;
pub mod header;
pub mod key;
pub mod lyrics;
pub mod music;
pub mod playback;

pub use broadcast::{LyricBroadcaster, LyricSink};
pub use error::KaraokeError;
pub use header::{Header, TimeSignature};
pub use music::{Music, Note, Syllable};

use grammar::{parse_from_line, BodyGrammar, BodySymbol};
use log::debug;
use playback::Sequence;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A compiled piece: its header and its music.
#[derive(Debug, Clone)]
pub struct Piece {
    header: Arc<Header>,
    music: Music,
}

impl Piece {
    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    pub fn music(&self) -> &Music {
        &self.music
    }

    pub fn into_music(self) -> Music {
        self.music
    }

    /// Declared voices, plus any voice that sings lyrics without being
    /// declared (lines before the first `V:` are sung by `unknown`).
    pub fn voices(&self) -> BTreeSet<String> {
        let mut voices = self.header.voices().clone();
        voices.extend(self.music.syllables().iter().map(|s| s.voice().to_string()));
        if voices.is_empty() {
            voices.insert(builder::DEFAULT_VOICE.to_string());
        }
        voices
    }

    /// Schedule the whole piece on a new [`Sequence`] at the header's tempo.
    pub fn sequence(
        &self,
        ticks_per_beat: u16,
        lyrics: &Arc<dyn LyricSink>,
    ) -> Result<Sequence, KaraokeError> {
        let mut sequence = Sequence::new(self.header.beats_per_minute(), ticks_per_beat)?;
        self.music.play(&mut sequence, 0.0, lyrics);
        Ok(sequence)
    }
}

/// Compile a complete piece.
/// This is the main entry point for the library.
pub fn compile(source: &str) -> Result<Piece, KaraokeError> {
    let mut header = Header::parse(source)?;
    let body = parse_from_line::<BodyGrammar>(BodySymbol::Body, header.music(), header.music_line())?;
    header.add_voices(builder::body_voices(&body)?);
    debug!(
        "Parsed body: {} lines, voices {:?}",
        body.children().len(),
        header.voices()
    );

    let header = Arc::new(header);
    let music = builder::build(&body, Arc::clone(&header))?;
    Ok(Piece { header, music })
}

/// Compile a piece and keep only its music.
pub fn parse(source: &str) -> Result<Music, KaraokeError> {
    compile(source).map(Piece::into_music)
}
