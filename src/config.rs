//! # Playback Configuration
//!
//! Optional YAML settings for the `karaoke` binary.
//!
//! ```yaml
//! ticks-per-beat: 480
//! voices: [soprano, alto]
//! midi-output: out.mid
//! ```
//!
//! Every field may be omitted. `voices` selects whose lyrics are echoed; when
//! empty, every voice of the piece is shown.
//!
//! ## Example
//! ```rust
//! use karaoke::config::PlaybackConfig;
//!
//! let config = PlaybackConfig::from_yaml_str("ticks-per-beat: 480\n").unwrap();
//! assert_eq!(config.ticks_per_beat, 480);
//! assert!(config.voices.is_empty());
//! assert!(config.midi_output.is_none());
//! ```

use crate::error::KaraokeError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TICKS_PER_BEAT: u16 = 96;

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub ticks_per_beat: Option<u16>,
    pub voices: Option<Vec<String>>,
    pub midi_output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub ticks_per_beat: u16,
    pub voices: Vec<String>,
    pub midi_output: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            voices: Vec::new(),
            midi_output: None,
        }
    }
}

impl PlaybackConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, KaraokeError> {
        // An empty document deserializes as unit, not as an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| KaraokeError::Config(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn load(path: &Path) -> Result<Self, KaraokeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, KaraokeError> {
        let ticks_per_beat = raw.ticks_per_beat.unwrap_or(DEFAULT_TICKS_PER_BEAT);
        if ticks_per_beat == 0 || ticks_per_beat > 0x7fff {
            return Err(KaraokeError::invalid_field(
                "ticks-per-beat",
                ticks_per_beat.to_string(),
                "must be between 1 and 32767",
            ));
        }

        let mut voices = Vec::new();
        for voice in raw.voices.unwrap_or_default() {
            let name = voice.trim();
            if name.is_empty() {
                return Err(KaraokeError::invalid_field("voices", voice.as_str(), "voice name is empty"));
            }
            if !voices.iter().any(|v| v == name) {
                voices.push(name.to_string());
            }
        }

        Ok(Self {
            ticks_per_beat,
            voices,
            midi_output: raw.midi_output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        assert_eq!(PlaybackConfig::from_yaml_str("").unwrap(), PlaybackConfig::default());
        assert_eq!(PlaybackConfig::default().ticks_per_beat, 96);
    }

    #[test]
    fn test_all_fields() {
        let yaml = "ticks-per-beat: 240\nvoices:\n  - upper\n  - ' lower '\n  - upper\nmidi-output: song.mid\n";
        let config = PlaybackConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.ticks_per_beat, 240);
        assert_eq!(config.voices, vec!["upper".to_string(), "lower".to_string()]);
        assert_eq!(config.midi_output, Some(PathBuf::from("song.mid")));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = PlaybackConfig::from_yaml_str("ticks-per-beat: [1, 2]\n").unwrap_err();
        assert!(matches!(err, KaraokeError::Config(_)));
        let err = PlaybackConfig::from_yaml_str("tempo: 3\n").unwrap_err();
        assert!(matches!(err, KaraokeError::Config(_)));
    }

    #[test]
    fn test_zero_ticks() {
        let err = PlaybackConfig::from_yaml_str("ticks-per-beat: 0\n").unwrap_err();
        assert!(matches!(err, KaraokeError::InvalidFieldValue { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "voices: [soprano]").unwrap();
        let config = PlaybackConfig::load(file.path()).unwrap();
        assert_eq!(config.voices, vec!["soprano".to_string()]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlaybackConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, KaraokeError::Io(_)));
    }
}
