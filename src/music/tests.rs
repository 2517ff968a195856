use super::*;
use crate::key::NoteName;
use crate::playback::{BeatCallback, Pitch};
use assert_approx_eq::assert_approx_eq;
use std::collections::hash_map::DefaultHasher;
use std::sync::Mutex;

fn header() -> Arc<Header> {
    Arc::new(Header::parse("X:1\nT:Algebra\nK:C\n").unwrap())
}

fn note(letter: NoteName, length: f64, h: &Arc<Header>) -> Music {
    Music::Note(Note::new(letter, 0, 0, length, 1.0, Arc::clone(h)))
}

fn syllable(line: &Arc<str>, begin: usize, end: usize) -> Syllable {
    Syllable::new(Arc::from("unknown"), Arc::clone(line), begin, end)
}

fn hash_of(music: &Music) -> u64 {
    let mut hasher = DefaultHasher::new();
    music.hash(&mut hasher);
    hasher.finish()
}

#[derive(Default)]
struct RecordingPlayer {
    notes: Vec<(u8, f64, f64)>,
    events: Vec<(f64, BeatCallback)>,
}

impl SequencePlayer for RecordingPlayer {
    fn add_note(&mut self, _: Instrument, pitch: Pitch, start_beat: f64, num_beats: f64) {
        self.notes.push((pitch.midi_note(), start_beat, num_beats));
    }

    fn add_event(&mut self, at_beat: f64, callback: BeatCallback) {
        self.events.push((at_beat, callback));
    }

    fn play(&mut self) -> Result<(), crate::KaraokeError> {
        for (beat, callback) in self.events.iter_mut() {
            callback(*beat);
        }
        Ok(())
    }
}

#[derive(Default)]
struct CollectingSink(Mutex<Vec<(String, String)>>);

impl LyricSink for CollectingSink {
    fn stream_to_all(&self, line: &str, voice: &str) {
        self.0.lock().unwrap().push((voice.to_string(), line.to_string()));
    }
}

#[test]
fn test_concat_duration_is_sum() {
    let h = header();
    let music = Music::concat(note(NoteName::C, 1.5, &h), note(NoteName::D, 0.25, &h), h.clone());
    assert_approx_eq!(music.duration(), 1.75);
}

#[test]
fn test_sequence_keeps_order_and_stays_shallow() {
    fn depth(music: &Music) -> usize {
        match music {
            Music::Concat { left, right, .. } => 1 + depth(left).max(depth(right)),
            _ => 0,
        }
    }

    let h = header();
    let letters = [NoteName::C, NoteName::D, NoteName::E, NoteName::F, NoteName::G];
    let parts: Vec<_> = letters.iter().map(|&l| note(l, 0.5, &h)).collect();
    let music = Music::sequence(parts, h.clone());
    assert_approx_eq!(music.duration(), 2.5);
    let played: Vec<_> = music.notes().iter().map(|n| n.letter()).collect();
    assert_eq!(played, letters);
    assert_eq!(depth(&music), 3);

    let many = Music::sequence((0..1024).map(|_| note(NoteName::A, 1.0, &h)).collect(), h.clone());
    assert_eq!(depth(&many), 10);
    assert_eq!(many.free_slots(), 1024);

    assert_eq!(Music::sequence(Vec::new(), h.clone()), Music::rest(0.0, h));
}

#[test]
fn test_overlay_duration_is_max() {
    let h = header();
    let music = Music::overlay(note(NoteName::C, 3.0, &h), Music::rest(5.0, h.clone()));
    assert_approx_eq!(music.duration(), 5.0);
}

#[test]
fn test_chord_duration_is_first_operand() {
    let h = header();
    let chord = Music::chord(note(NoteName::C, 1.0, &h), note(NoteName::E, 4.0, &h), h.clone());
    assert_approx_eq!(chord.duration(), 1.0);
}

#[test]
fn test_free_slots() {
    let h = header();
    let chord = Music::chord(note(NoteName::C, 1.0, &h), note(NoteName::E, 1.0, &h), h.clone());
    assert_eq!(chord.free_slots(), 1);
    assert_eq!(Music::rest(1.0, h.clone()).free_slots(), 0);
    assert_eq!(
        Music::overlay(note(NoteName::C, 1.0, &h), note(NoteName::D, 1.0, &h)).free_slots(),
        0
    );

    let line = Music::concat(chord, note(NoteName::G, 1.0, &h), h.clone());
    assert_eq!(line.free_slots(), 2);
}

#[test]
fn test_binding_fills_left_first() {
    let h = header();
    let text: Arc<str> = Arc::from("do re");
    let line = Music::concat(
        Music::concat(Music::rest(1.0, h.clone()), note(NoteName::C, 1.0, &h), h.clone()),
        note(NoteName::D, 1.0, &h),
        h.clone(),
    );

    let bound = line.bind_syllables([syllable(&text, 0, 2), syllable(&text, 3, 5)]);
    let words: Vec<_> = bound.syllables().iter().map(|s| s.text()).collect();
    assert_eq!(words, vec!["do", "re"]);
    assert_eq!(bound.free_slots(), 0);
    let sung: Vec<_> = bound.notes().iter().map(|n| n.syllable().map(|s| s.text())).collect();
    assert_eq!(sung, vec![Some("do".to_string()), Some("re".to_string())]);
}

#[test]
fn test_binding_does_not_modify_original() {
    let h = header();
    let text: Arc<str> = Arc::from("la");
    let original = Music::concat(note(NoteName::A, 1.0, &h), note(NoteName::B, 1.0, &h), h.clone());
    let bound = original.bind_syllable(syllable(&text, 0, 2));

    assert_eq!(original.free_slots(), 2);
    assert!(original.syllables().is_empty());
    assert_eq!(bound.free_slots(), 1);
    assert_eq!(bound, original);
}

#[test]
fn test_chord_takes_one_syllable_as_a_whole() {
    let h = header();
    let text: Arc<str> = Arc::from("oh yes");
    let chord = Music::chord(note(NoteName::C, 1.0, &h), note(NoteName::G, 1.0, &h), h.clone());
    let bound = chord.bind_syllables([syllable(&text, 0, 2), syllable(&text, 3, 6)]);

    assert_eq!(bound.syllables().len(), 1);
    assert!(bound.notes().iter().all(|n| n.syllable().is_none()));
}

#[test]
fn test_binding_nothing_is_identity() {
    let h = header();
    let music = Music::overlay(
        Music::concat(note(NoteName::E, 1.0, &h), note(NoteName::F, 2.0, &h), h.clone()),
        Music::rest(0.0, h.clone()),
    );
    let bound = music.bind_syllables(Vec::new());
    assert_eq!(bound, music);
    assert_eq!(hash_of(&bound), hash_of(&music));
}

#[test]
fn test_excess_syllables_are_dropped() {
    let h = header();
    let text: Arc<str> = Arc::from("a b c");
    let music = note(NoteName::C, 1.0, &h);
    let bound = music.bind_syllables([syllable(&text, 0, 1), syllable(&text, 2, 3), syllable(&text, 4, 5)]);
    assert_eq!(bound.syllables().len(), 1);
    assert_eq!(bound.syllables()[0].text(), "a");
}

#[test]
fn test_rest_and_overlay_are_inert() {
    let h = header();
    let text: Arc<str> = Arc::from("x");
    let overlay = Music::overlay(note(NoteName::C, 1.0, &h), note(NoteName::D, 1.0, &h));
    assert!(overlay.bind_syllable(syllable(&text, 0, 1)).syllables().is_empty());
    let rest = Music::rest(2.0, h);
    assert!(rest.bind_syllable(syllable(&text, 0, 1)).syllables().is_empty());
}

#[test]
fn test_structural_equality() {
    let h = header();
    let a = Music::concat(note(NoteName::C, 1.0, &h), note(NoteName::D, 1.0, &h), h.clone());
    let b = Music::concat(note(NoteName::C, 1.0, &h), note(NoteName::D, 1.0, &h), h.clone());
    let swapped = Music::concat(note(NoteName::D, 1.0, &h), note(NoteName::C, 1.0, &h), h.clone());
    let overlaid = Music::overlay(note(NoteName::C, 1.0, &h), note(NoteName::D, 1.0, &h));

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, swapped);
    assert_ne!(a, overlaid);
    assert_eq!(Music::rest(0.0, h.clone()), Music::rest(-0.0, h.clone()));
    assert_eq!(hash_of(&Music::rest(0.0, h.clone())), hash_of(&Music::rest(-0.0, h)));
}

#[test]
fn test_play_schedules_notes_and_lyrics() {
    let h = header();
    let text: Arc<str> = Arc::from("hel-lo");
    let line = Music::concat(
        Music::concat(note(NoteName::C, 2.0, &h), Music::rest(1.0, h.clone()), h.clone()),
        Music::chord(note(NoteName::E, 1.0, &h), note(NoteName::G, 1.0, &h), h.clone()),
        h.clone(),
    )
    .bind_syllables([syllable(&text, 0, 3), syllable(&text, 4, 6)]);

    let sink = Arc::new(CollectingSink::default());
    let lyrics: Arc<dyn LyricSink> = sink.clone();
    let mut player = RecordingPlayer::default();
    line.play(&mut player, 0.0, &lyrics);

    assert_eq!(player.notes, vec![(60, 0.0, 2.0), (64, 3.0, 1.0), (67, 3.0, 1.0)]);
    let beats: Vec<_> = player.events.iter().map(|(b, _)| *b).collect();
    assert_eq!(beats, vec![0.0, 3.0]);

    player.play().unwrap();
    let streamed = sink.0.lock().unwrap().clone();
    assert_eq!(
        streamed,
        vec![
            ("unknown".to_string(), "*hel*-lo".to_string()),
            ("unknown".to_string(), "hel-*lo*".to_string())
        ]
    );
}

#[test]
fn test_skipped_syllable_is_silent() {
    let h = header();
    let text: Arc<str> = Arc::from("");
    let music = note(NoteName::C, 1.0, &h).bind_syllable(Syllable::skipped(Arc::from("v"), text));
    let lyrics: Arc<dyn LyricSink> = Arc::new(CollectingSink::default());
    let mut player = RecordingPlayer::default();
    music.play(&mut player, 0.0, &lyrics);
    assert_eq!(music.free_slots(), 0);
    assert!(player.events.is_empty());
}

#[test]
fn test_overlay_plays_voices_together() {
    let h = header();
    let music = Music::overlay(
        Music::concat(note(NoteName::C, 1.0, &h), note(NoteName::D, 1.0, &h), h.clone()),
        note(NoteName::A, 2.0, &h),
    );
    let lyrics: Arc<dyn LyricSink> = Arc::new(CollectingSink::default());
    let mut player = RecordingPlayer::default();
    music.play(&mut player, 4.0, &lyrics);
    assert_eq!(player.notes, vec![(60, 4.0, 1.0), (62, 5.0, 1.0), (69, 4.0, 2.0)]);
}
