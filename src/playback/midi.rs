// Standard MIDI File export of a recorded sequence.
//
// One track: tempo, program change, then note-on/note-off pairs on channel 0.
// Beats map to ticks through the sequence's ticks-per-beat.

use super::sequence::Sequence;
use super::types::Instrument;
use crate::error::KaraokeError;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use std::path::Path;

const VELOCITY: u8 = 80;

impl Sequence {
    /// Convert the recorded notes to an in-memory SMF.
    pub fn to_smf(&self) -> Smf<'static> {
        let ticks_per_beat = self.ticks_per_beat().min(0x7fff);
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(ticks_per_beat)),
        ));

        let channel = u4::new(0);
        let tick = |beat: f64| (beat.max(0.0) * ticks_per_beat as f64).round() as u32;

        // (tick, is_on, key); offs sort before ons at the same tick
        let mut messages: Vec<(u32, bool, u8)> = Vec::with_capacity(self.notes().len() * 2);
        for note in self.notes() {
            let start = tick(note.start_beat);
            let end = tick(note.start_beat + note.num_beats).max(start);
            messages.push((start, true, note.midi_note.min(127)));
            messages.push((end, false, note.midi_note.min(127)));
        }
        messages.sort_by_key(|&(tick, is_on, key)| (tick, is_on, key));

        let tempo_microseconds = (60_000_000.0 / self.beats_per_minute()).round() as u32;
        let mut track: Track<'static> = vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
                    tempo_microseconds.min(0x00ff_ffff),
                ))),
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::ProgramChange {
                        program: u7::new(Instrument::Piano.program()),
                    },
                },
            },
        ];

        let mut last_tick = 0;
        for (at, is_on, key) in messages {
            let message = if is_on {
                MidiMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(VELOCITY),
                }
            } else {
                MidiMessage::NoteOff {
                    key: u7::new(key),
                    vel: u7::new(0),
                }
            };
            track.push(TrackEvent {
                delta: u28::new(at - last_tick),
                kind: TrackEventKind::Midi { channel, message },
            });
            last_tick = at;
        }
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        smf.tracks.push(track);
        smf
    }

    /// Write the recorded notes to `path` as a Standard MIDI File.
    pub fn write_midi(&self, path: &Path) -> Result<(), KaraokeError> {
        let mut buf = Vec::new();
        self.to_smf().write_std(&mut buf)?;
        std::fs::write(path, &buf)?;
        Ok(())
    }
}
