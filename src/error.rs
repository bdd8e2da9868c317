//! Error types for livecap.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivecapError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio capture failed: {message}")]
    Capture { message: String },

    // Format conversion errors (normally dropped, not propagated)
    #[error("Audio conversion failed: {message}")]
    Conversion { message: String },

    // Speech recognition errors
    #[error("Recognition error: {message}")]
    Recognition { message: String },

    // Translation errors
    #[error("Translation error for {language}: {message}")]
    Translation { language: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LivecapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = LivecapError::ConfigInvalidValue {
            key: "max_history".to_string(),
            message: "must be at least 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for max_history: must be at least 1"
        );
    }

    #[test]
    fn test_capture_display() {
        let error = LivecapError::Capture {
            message: "device disconnected".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: device disconnected");
    }

    #[test]
    fn test_recognition_display() {
        let error = LivecapError::Recognition {
            message: "session lost".to_string(),
        };
        assert_eq!(error.to_string(), "Recognition error: session lost");
    }

    #[test]
    fn test_translation_display() {
        let error = LivecapError::Translation {
            language: "english".to_string(),
            message: "service unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Translation error for english: service unavailable"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: LivecapError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: LivecapError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LivecapError>();
        assert_sync::<LivecapError>();
    }
}
