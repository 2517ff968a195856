//! Playback value types: pitches, instruments, and the recorded schedule.

use crate::key::NoteName;
use serde::Serialize;

/// A semitone-addressable pitch. `C` (middle C) is MIDI 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Pitch(i16);

impl Pitch {
    const MIDDLE_C: i16 = 60;

    pub fn new(letter: NoteName) -> Self {
        Pitch(Self::MIDDLE_C + letter.semitones_above_c())
    }

    pub fn transpose(self, semitones: i16) -> Self {
        Pitch(self.0.saturating_add(semitones))
    }

    /// Semitones relative to MIDI 0; may fall outside the MIDI range.
    pub fn value(&self) -> i16 {
        self.0
    }

    /// MIDI note number, clamped to 0-127.
    pub fn midi_note(&self) -> u8 {
        self.0.clamp(0, 127) as u8
    }
}

impl From<NoteName> for Pitch {
    fn from(letter: NoteName) -> Self {
        Pitch::new(letter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    #[default]
    Piano,
}

impl Instrument {
    /// General MIDI program number.
    pub fn program(&self) -> u8 {
        match self {
            Instrument::Piano => 0,
        }
    }
}

/// One note scheduled on a sequence.
///
/// # Fields
/// - `midi_note`: clamped MIDI note number
/// - `start_beat`: offset from the start of the piece, in beats
/// - `num_beats`: sounding length in beats
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNote {
    pub instrument: Instrument,
    pub midi_note: u8,
    pub start_beat: f64,
    pub num_beats: f64,
}

/// Snapshot of everything a sequence has recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceData {
    pub beats_per_minute: f64,
    pub ticks_per_beat: u16,
    pub notes: Vec<ScheduledNote>,
    /// Beats at which callbacks are scheduled, in the order they were added.
    pub event_beats: Vec<f64>,
}

impl SequenceData {
    /// Beat at which the last note stops sounding.
    pub fn end_beat(&self) -> f64 {
        self.notes
            .iter()
            .map(|n| n.start_beat + n.num_beats)
            .fold(0.0, f64::max)
    }
}
