use crate::defaults;
use crate::error::{LivecapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub captions: CaptionConfig,
    pub translation: TranslationConfig,
}

/// Audio normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Target sample rate frames are converted to before recognition.
    pub sample_rate: u32,
    /// Target channel count (mono for speech engines).
    pub channels: u16,
    /// Gain factor applied to every sample, clamped to the valid range.
    pub gain: f32,
}

/// Caption state configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptionConfig {
    /// Number of finalized lines kept in history.
    pub max_history: usize,
    /// Minimum interval between forwarded partial transcripts (ms).
    pub partial_debounce_ms: u64,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    /// Active target languages. One worker is spawned per entry.
    pub languages: Vec<String>,
    /// Source language hint passed to the translation engine, if known.
    pub source_language: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            channels: defaults::CHANNELS,
            gain: defaults::GAIN,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            max_history: defaults::MAX_HISTORY,
            partial_debounce_ms: defaults::PARTIAL_DEBOUNCE_MS,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            languages: vec!["english".to_string()],
            source_language: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file is
    /// missing or unreadable. Invalid TOML falls back to defaults with a
    /// warning rather than taking the pipeline down.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    tracing::warn!("invalid config at {}: {e}; using defaults", path.display());
                    Self::default()
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LIVECAP_LANGUAGES → translation.languages (comma-separated)
    /// - LIVECAP_SOURCE_LANGUAGE → translation.source_language
    /// - LIVECAP_GAIN → audio.gain
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(languages) = std::env::var("LIVECAP_LANGUAGES")
            && !languages.is_empty()
        {
            self.translation.languages = languages
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(source) = std::env::var("LIVECAP_SOURCE_LANGUAGE")
            && !source.is_empty()
        {
            self.translation.source_language = Some(source);
        }

        if let Ok(gain) = std::env::var("LIVECAP_GAIN")
            && let Ok(value) = gain.parse::<f32>()
        {
            self.audio.gain = value;
        }

        self
    }

    /// Validate configuration values the pipeline depends on.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(LivecapError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.channels == 0 {
            return Err(LivecapError::ConfigInvalidValue {
                key: "audio.channels".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(self.audio.gain.is_finite() && self.audio.gain > 0.0) {
            return Err(LivecapError::ConfigInvalidValue {
                key: "audio.gain".to_string(),
                message: "must be a positive finite number".to_string(),
            });
        }
        if self.captions.max_history == 0 {
            return Err(LivecapError::ConfigInvalidValue {
                key: "captions.max_history".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Partial debounce interval as a `Duration`.
    pub fn partial_debounce(&self) -> Duration {
        Duration::from_millis(self.captions.partial_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.sample_rate, 16_000);
        assert_eq!(config.audio.channels, 1);
        assert_eq!(config.captions.max_history, 4);
        assert_eq!(config.captions.partial_debounce_ms, 200);
        assert_eq!(config.translation.languages, vec!["english".to_string()]);
    }

    #[test]
    fn test_load_partial_toml_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[captions]\nmax_history = 2\n\n[translation]\nlanguages = [\"english\", \"german\"]"
        )
        .expect("write config");

        let config = Config::load(file.path()).expect("load config");
        assert_eq!(config.captions.max_history, 2);
        assert_eq!(config.captions.partial_debounce_ms, 200);
        assert_eq!(
            config.translation.languages,
            vec!["english".to_string(), "german".to_string()]
        );
        assert_eq!(config.audio.sample_rate, 16_000);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/livecap.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_toml_falls_back() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "not = valid = toml").expect("write config");
        let config = Config::load_or_default(file.path());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_zero_max_history() {
        let mut config = Config::default();
        config.captions.max_history = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_history"));
    }

    #[test]
    fn test_validate_rejects_zero_sample_rate() {
        let mut config = Config::default();
        config.audio.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nonpositive_gain() {
        let mut config = Config::default();
        config.audio.gain = 0.0;
        assert!(config.validate().is_err());
        config.audio.gain = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_debounce_duration() {
        let config = Config::default();
        assert_eq!(config.partial_debounce(), Duration::from_millis(200));
    }
}
