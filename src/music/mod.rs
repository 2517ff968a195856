//! # Music Algebra
//!
//! The immutable tree a piece compiles to.
//!
//! ## Variants
//! ```text
//! Music
//!   ├── Note     pitch + length (× tuplet factor), optional syllable
//!   ├── Rest     silence of a given length
//!   ├── Chord    two musics sounding together, one syllable for the pair
//!   ├── Concat   left, then right
//!   └── Overlay  two independent voices sounding together
//! ```
//!
//! ## Key Concepts
//!
//! ### Duration
//! Measured in note-length units (a bare `C` lasts 1). `Concat` sums its
//! children, `Overlay` takes the longer, and `Chord` takes its first operand.
//!
//! ### Lyric Slots
//! A note or chord without a syllable is a free slot. Binding fills the first
//! free slot in depth-first, left-to-right order and returns a new tree; the
//! original is never modified. Rests and overlays have no slots.
//!
//! ### Equality
//! Musical: notes compare by pitch and duration, composites by structure.
//! Bound syllables are ignored.
//!
//! ## Example
//! ```rust
//! let music = karaoke::parse("X:1\nT:Duet\nK:C\nV:1\nC2 D|\nV:2\nE4|\n").unwrap();
//! assert_eq!(music.duration(), 4.0);
//! assert_eq!(music.notes().len(), 3);
//! ```

mod note;
mod syllable;

pub use note::{parse_length, Note};
pub use syllable::Syllable;

use crate::broadcast::LyricSink;
use crate::header::Header;
use crate::playback::{Instrument, SequencePlayer};
use log::debug;
use note::hash_beats;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Music {
    Note(Note),
    Rest {
        duration: f64,
        header: Arc<Header>,
    },
    Chord {
        left: Arc<Music>,
        right: Arc<Music>,
        syllable: Option<Syllable>,
        header: Arc<Header>,
    },
    Concat {
        left: Arc<Music>,
        right: Arc<Music>,
        duration: f64,
        free_slots: usize,
        header: Arc<Header>,
    },
    Overlay {
        left: Arc<Music>,
        right: Arc<Music>,
    },
}

impl Music {
    pub fn rest(duration: f64, header: Arc<Header>) -> Self {
        Music::Rest { duration, header }
    }

    pub fn chord(left: Music, right: Music, header: Arc<Header>) -> Self {
        Music::Chord {
            left: Arc::new(left),
            right: Arc::new(right),
            syllable: None,
            header,
        }
    }

    pub fn concat(left: Music, right: Music, header: Arc<Header>) -> Self {
        Self::concat_shared(Arc::new(left), Arc::new(right), header)
    }

    fn concat_shared(left: Arc<Music>, right: Arc<Music>, header: Arc<Header>) -> Self {
        let duration = left.duration() + right.duration();
        let free_slots = left.free_slots() + right.free_slots();
        Music::Concat {
            left,
            right,
            duration,
            free_slots,
            header,
        }
    }

    /// `parts` played one after another, as a balanced tree of concats.
    /// Empty input gives a zero-length rest.
    pub fn sequence(parts: Vec<Music>, header: Arc<Header>) -> Self {
        let mut level = parts;
        if level.is_empty() {
            return Music::rest(0.0, header);
        }
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut pairs = level.into_iter();
            while let Some(left) = pairs.next() {
                next.push(match pairs.next() {
                    Some(right) => Music::concat(left, right, Arc::clone(&header)),
                    None => left,
                });
            }
            level = next;
        }
        level.pop().unwrap_or_else(|| Music::rest(0.0, header))
    }

    pub fn overlay(left: Music, right: Music) -> Self {
        Music::Overlay {
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    /// The shared header, absent on overlays.
    pub fn header(&self) -> Option<&Arc<Header>> {
        match self {
            Music::Note(note) => Some(note.header()),
            Music::Rest { header, .. }
            | Music::Chord { header, .. }
            | Music::Concat { header, .. } => Some(header),
            Music::Overlay { .. } => None,
        }
    }

    /// Length in note-length units.
    pub fn duration(&self) -> f64 {
        match self {
            Music::Note(note) => note.duration(),
            Music::Rest { duration, .. } => *duration,
            Music::Chord { left, .. } => left.duration(),
            Music::Concat { duration, .. } => *duration,
            Music::Overlay { left, right } => left.duration().max(right.duration()),
        }
    }

    /// Number of notes and chords still waiting for a syllable.
    pub fn free_slots(&self) -> usize {
        match self {
            Music::Note(note) => usize::from(note.syllable().is_none()),
            Music::Chord { syllable, .. } => usize::from(syllable.is_none()),
            Music::Concat { free_slots, .. } => *free_slots,
            Music::Rest { .. } | Music::Overlay { .. } => 0,
        }
    }

    /// A tree with `syllable` bound to the first free slot. Without a free
    /// slot the result equals `self` and the syllable is dropped.
    pub fn bind_syllable(&self, syllable: Syllable) -> Music {
        match self {
            Music::Note(note) if note.syllable().is_none() => Music::Note(note.with_syllable(syllable)),
            Music::Chord {
                left,
                right,
                syllable: None,
                header,
            } => Music::Chord {
                left: Arc::clone(left),
                right: Arc::clone(right),
                syllable: Some(syllable),
                header: Arc::clone(header),
            },
            Music::Concat {
                left,
                right,
                free_slots,
                header,
                ..
            } if *free_slots > 0 => {
                if left.free_slots() > 0 {
                    Self::concat_shared(
                        Arc::new(left.bind_syllable(syllable)),
                        Arc::clone(right),
                        Arc::clone(header),
                    )
                } else {
                    Self::concat_shared(
                        Arc::clone(left),
                        Arc::new(right.bind_syllable(syllable)),
                        Arc::clone(header),
                    )
                }
            }
            _ => self.clone(),
        }
    }

    /// Bind syllables in order, one per free slot. Extra syllables are dropped.
    pub fn bind_syllables<I>(&self, syllables: I) -> Music
    where
        I: IntoIterator<Item = Syllable>,
    {
        let mut music = self.clone();
        let mut dropped = 0;
        for syllable in syllables {
            if music.free_slots() == 0 {
                dropped += 1;
                continue;
            }
            music = music.bind_syllable(syllable);
        }
        if dropped > 0 {
            debug!("Dropped {} syllables with no note left to sing them", dropped);
        }
        if music.free_slots() > 0 {
            debug!("{} notes left without a syllable", music.free_slots());
        }
        music
    }

    /// Schedule this music on `player` starting at `at_beat`. Bound syllables
    /// are streamed to `lyrics` when playback reaches their note.
    pub fn play(&self, player: &mut dyn SequencePlayer, at_beat: f64, lyrics: &Arc<dyn LyricSink>) {
        match self {
            Music::Note(note) => {
                player.add_note(Instrument::Piano, note.pitch(), at_beat, note.duration());
                if let Some(syllable) = note.syllable() {
                    schedule_syllable(player, at_beat, syllable, lyrics);
                }
            }
            Music::Rest { .. } => {}
            Music::Chord {
                left,
                right,
                syllable,
                ..
            } => {
                left.play(player, at_beat, lyrics);
                right.play(player, at_beat, lyrics);
                if let Some(syllable) = syllable {
                    schedule_syllable(player, at_beat, syllable, lyrics);
                }
            }
            Music::Concat { left, right, .. } => {
                left.play(player, at_beat, lyrics);
                right.play(player, at_beat + left.duration(), lyrics);
            }
            Music::Overlay { left, right } => {
                left.play(player, at_beat, lyrics);
                right.play(player, at_beat, lyrics);
            }
        }
    }

    /// Every note in playback order, chord members included.
    pub fn notes(&self) -> Vec<&Note> {
        let mut notes = Vec::new();
        self.collect_notes(&mut notes);
        notes
    }

    fn collect_notes<'a>(&'a self, out: &mut Vec<&'a Note>) {
        match self {
            Music::Note(note) => out.push(note),
            Music::Rest { .. } => {}
            Music::Chord { left, right, .. }
            | Music::Concat { left, right, .. }
            | Music::Overlay { left, right } => {
                left.collect_notes(out);
                right.collect_notes(out);
            }
        }
    }

    /// Every bound syllable in playback order.
    pub fn syllables(&self) -> Vec<&Syllable> {
        let mut syllables = Vec::new();
        self.collect_syllables(&mut syllables);
        syllables
    }

    fn collect_syllables<'a>(&'a self, out: &mut Vec<&'a Syllable>) {
        match self {
            Music::Note(note) => out.extend(note.syllable()),
            Music::Rest { .. } => {}
            Music::Chord {
                left,
                right,
                syllable,
                ..
            } => {
                out.extend(syllable.as_ref());
                left.collect_syllables(out);
                right.collect_syllables(out);
            }
            Music::Concat { left, right, .. } | Music::Overlay { left, right } => {
                left.collect_syllables(out);
                right.collect_syllables(out);
            }
        }
    }
}

fn schedule_syllable(
    player: &mut dyn SequencePlayer,
    at_beat: f64,
    syllable: &Syllable,
    lyrics: &Arc<dyn LyricSink>,
) {
    if syllable.is_skipped() {
        return;
    }
    let line = syllable.highlighted();
    let voice = syllable.voice().to_string();
    let lyrics = Arc::clone(lyrics);
    player.add_event(
        at_beat,
        Box::new(move |_| lyrics.stream_to_all(&line, &voice)),
    );
}

impl PartialEq for Music {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Music::Note(a), Music::Note(b)) => a == b,
            (Music::Rest { duration: a, .. }, Music::Rest { duration: b, .. }) => a == b,
            (
                Music::Chord {
                    left: l1, right: r1, ..
                },
                Music::Chord {
                    left: l2, right: r2, ..
                },
            )
            | (
                Music::Concat {
                    left: l1, right: r1, ..
                },
                Music::Concat {
                    left: l2, right: r2, ..
                },
            )
            | (
                Music::Overlay {
                    left: l1, right: r1,
                },
                Music::Overlay {
                    left: l2, right: r2,
                },
            ) => l1 == l2 && r1 == r2,
            _ => false,
        }
    }
}

impl Eq for Music {}

impl Hash for Music {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Music::Note(note) => note.hash(state),
            Music::Rest { duration, .. } => hash_beats(*duration, state),
            Music::Chord { left, right, .. }
            | Music::Concat { left, right, .. }
            | Music::Overlay { left, right } => {
                left.hash(state);
                right.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests;
