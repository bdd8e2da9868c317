//! livecap - Real-time captioning core
//!
//! Streaming audio → speech recognition → caption state → per-language
//! translation, built for live presentation of stable finalized lines and a
//! volatile in-progress partial line.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod captions;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod stt;
pub mod translate;

// Core traits (source → recognize → translate)
pub use audio::source::AudioSource;
pub use stt::engine::{SpeechEngine, SpeechSession};
pub use translate::engine::Translator;

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineHandle};

// Caption state
pub use captions::{CaptionLine, CaptionSnapshot, CaptionStore, LineId, PartialCaption};

// Error handling
pub use error::{LivecapError, Result};

// Config
pub use config::Config;

/// Build version string from the crate version.
pub fn version_string() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
