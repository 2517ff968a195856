//! # Lyric Broadcasting
//!
//! Fan-out of highlighted lyric lines to per-voice subscribers.
//!
//! Delivery is best-effort: a subscriber whose writer fails is dropped and
//! the rest still receive the line.
//!
//! ## Example
//! ```rust
//! use karaoke::broadcast::{LyricBroadcaster, LyricSink};
//! use std::io::sink;
//!
//! let broadcaster = LyricBroadcaster::new();
//! broadcaster.add_writer(Box::new(sink()), "soprano");
//! broadcaster.stream_to_all("*A*mazing grace", "soprano");
//! broadcaster.stream_to_all("nobody hears this", "alto");
//! assert_eq!(broadcaster.subscriber_count("soprano"), 1);
//! ```

use log::warn;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

/// Receives rendered lyric lines during playback.
pub trait LyricSink: Send + Sync {
    fn stream_to_all(&self, line: &str, voice: &str);
}

type Writers = HashMap<String, Vec<Box<dyn Write + Send>>>;

#[derive(Default)]
pub struct LyricBroadcaster {
    writers: Mutex<Writers>,
}

impl LyricBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `writer` to lyric lines of `voice`.
    pub fn add_writer(&self, writer: Box<dyn Write + Send>, voice: &str) {
        self.lock().entry(voice.to_string()).or_default().push(writer);
    }

    pub fn subscriber_count(&self, voice: &str) -> usize {
        self.lock().get(voice).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Writers> {
        // A panicking subscriber must not silence everyone else.
        self.writers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LyricSink for LyricBroadcaster {
    fn stream_to_all(&self, line: &str, voice: &str) {
        let mut writers = self.lock();
        let Some(subscribers) = writers.get_mut(voice) else {
            return;
        };
        subscribers.retain_mut(|writer| {
            match writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping lyric subscriber for voice '{}': {}", voice, e);
                    false
                }
            }
        });
    }
}
