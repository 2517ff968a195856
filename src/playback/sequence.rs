//! The playback sink contract and an in-memory recording implementation.

use super::types::{Instrument, Pitch, ScheduledNote, SequenceData};
use crate::error::KaraokeError;
use log::{debug, trace};
use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A zero-duration action fired when playback reaches a beat.
pub type BeatCallback = Box<dyn FnMut(f64) + Send>;

/// Where [`Music::play`](crate::Music::play) sends its sound and lyric events.
pub trait SequencePlayer {
    fn add_note(&mut self, instrument: Instrument, pitch: Pitch, start_beat: f64, num_beats: f64);

    fn add_event(&mut self, at_beat: f64, callback: BeatCallback);

    /// Begin asynchronous playback of everything added so far.
    fn play(&mut self) -> Result<(), KaraokeError>;
}

/// Records notes and beat callbacks; `play` fires the callbacks on a
/// background thread at their wall-clock times.
pub struct Sequence {
    beats_per_minute: f64,
    ticks_per_beat: u16,
    notes: Vec<ScheduledNote>,
    events: Vec<(f64, BeatCallback)>,
    event_beats: Vec<f64>,
    started: bool,
    handle: Option<JoinHandle<()>>,
}

impl Sequence {
    pub fn new(beats_per_minute: f64, ticks_per_beat: u16) -> Result<Self, KaraokeError> {
        if !(beats_per_minute.is_finite() && beats_per_minute > 0.0) {
            return Err(KaraokeError::invalid_field(
                "beats per minute",
                beats_per_minute.to_string(),
                "must be positive",
            ));
        }
        if ticks_per_beat == 0 {
            return Err(KaraokeError::invalid_field("ticks-per-beat", "0", "must be positive"));
        }
        Ok(Self {
            beats_per_minute,
            ticks_per_beat,
            notes: Vec::new(),
            events: Vec::new(),
            event_beats: Vec::new(),
            started: false,
            handle: None,
        })
    }

    pub fn beats_per_minute(&self) -> f64 {
        self.beats_per_minute
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    pub fn notes(&self) -> &[ScheduledNote] {
        &self.notes
    }

    pub fn data(&self) -> SequenceData {
        SequenceData {
            beats_per_minute: self.beats_per_minute,
            ticks_per_beat: self.ticks_per_beat,
            notes: self.notes.clone(),
            event_beats: self.event_beats.clone(),
        }
    }

    /// Wall-clock offset of `beat` from the start of playback.
    pub fn time_of(&self, beat: f64) -> Duration {
        Duration::from_secs_f64((beat * 60.0 / self.beats_per_minute).max(0.0))
    }

    /// Block until every scheduled callback has fired.
    pub fn wait(&mut self) -> Result<(), KaraokeError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| KaraokeError::Playback("playback thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl SequencePlayer for Sequence {
    fn add_note(&mut self, instrument: Instrument, pitch: Pitch, start_beat: f64, num_beats: f64) {
        self.notes.push(ScheduledNote {
            instrument,
            midi_note: pitch.midi_note(),
            start_beat,
            num_beats,
        });
    }

    fn add_event(&mut self, at_beat: f64, callback: BeatCallback) {
        self.event_beats.push(at_beat);
        self.events.push((at_beat, callback));
    }

    fn play(&mut self) -> Result<(), KaraokeError> {
        if self.started {
            return Err(KaraokeError::Playback("sequence has already been played".to_string()));
        }
        self.started = true;

        let mut events = std::mem::take(&mut self.events);
        events.sort_by(|a, b| a.0.total_cmp(&b.0));
        let schedule: Vec<(Duration, f64, BeatCallback)> = events
            .into_iter()
            .map(|(beat, callback)| (self.time_of(beat), beat, callback))
            .collect();
        debug!(
            "Playing {} notes and {} events at {:.1} BPM",
            self.notes.len(),
            schedule.len(),
            self.beats_per_minute
        );

        let handle = thread::Builder::new()
            .name("karaoke-playback".to_string())
            .spawn(move || {
                let start = Instant::now();
                for (offset, beat, mut callback) in schedule {
                    let elapsed = start.elapsed();
                    if offset > elapsed {
                        thread::sleep(offset - elapsed);
                    }
                    trace!("Beat {}", beat);
                    callback(beat);
                }
            })?;
        self.handle = Some(handle);
        Ok(())
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("beats_per_minute", &self.beats_per_minute)
            .field("ticks_per_beat", &self.ticks_per_beat)
            .field("notes", &self.notes.len())
            .field("events", &self.event_beats.len())
            .field("started", &self.started)
            .finish()
    }
}
