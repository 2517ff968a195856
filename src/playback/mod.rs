//! # Playback Module
//!
//! The sink a compiled piece is played into, and what can be done with it.
//!
//! ## Purpose
//! [`Music::play`](crate::Music::play) walks the tree and schedules every note
//! and lyric event on a [`SequencePlayer`]. The [`Sequence`] implementation
//! records the schedule so it can be:
//! 1. **Played** - lyric callbacks fire on a background thread in real time
//! 2. **Exported** - written as a Standard MIDI File via `midly`
//! 3. **Dumped** - serialized as [`SequenceData`]
//!
//! There is no audio synthesis; MIDI export is how the notes are heard.
//!
//! ## Sub-modules
//! - `types` - Pitch, Instrument, ScheduledNote, SequenceData
//! - `sequence` - SequencePlayer trait and the Sequence recorder
//! - `midi` - Standard MIDI File export
//!
//! ## Example
//! ```rust
//! use karaoke::playback::{Instrument, Pitch, Sequence, SequencePlayer};
//! use karaoke::key::NoteName;
//!
//! let mut sequence = Sequence::new(120.0, 96).unwrap();
//! sequence.add_note(Instrument::Piano, Pitch::new(NoteName::A), 0.0, 2.0);
//!
//! let data = sequence.data();
//! assert_eq!(data.notes[0].midi_note, 69);
//! assert_eq!(data.end_beat(), 2.0);
//! ```

mod midi;
mod sequence;
mod types;


pub use sequence::{BeatCallback, Sequence, SequencePlayer};
pub use types::{Instrument, Pitch, ScheduledNote, SequenceData};
