//! Streaming speech recognition seam and adapter.

pub mod adapter;
pub mod engine;

pub use adapter::{AdapterState, TranscriptionAdapter};
pub use engine::{MockSpeechEngine, RecognitionEvent, SpeechEngine, SpeechSession};
