//! Audio capture seam and format normalization.

pub mod converter;
pub mod frame;
pub mod source;
pub mod wav;

pub use converter::{ConverterConfig, FormatConverter};
pub use frame::{AudioFormat, AudioFrame, SampleFormat, SamplePayload};
pub use source::{AudioSource, MockAudioSource};
pub use wav::WavFileSource;
