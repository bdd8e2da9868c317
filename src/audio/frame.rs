//! Audio frame types.
//!
//! Frames carry their own format descriptor because the capture source may
//! switch formats mid-stream (e.g. a device change); the converter, not the
//! source, owns normalization.

/// Sample encoding of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Signed 16-bit integer PCM.
    I16,
    /// 32-bit float PCM in [-1.0, 1.0].
    F32,
}

/// Format descriptor for one frame of captured audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Sample encoding.
    pub sample_format: SampleFormat,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16, sample_format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
        }
    }
}

/// Interleaved sample payload in the source's native encoding.
#[derive(Debug, Clone)]
pub enum SamplePayload {
    I16(Vec<i16>),
    F32(Vec<f32>),
}

impl SamplePayload {
    /// Number of samples across all channels.
    pub fn len(&self) -> usize {
        match self {
            SamplePayload::I16(s) => s.len(),
            SamplePayload::F32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One ephemeral buffer of captured audio. Consumed exactly once by the
/// format converter, never retained.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub payload: SamplePayload,
    pub format: AudioFormat,
}

impl AudioFrame {
    /// Creates a frame of i16 samples.
    pub fn from_i16(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            payload: SamplePayload::I16(samples),
            format: AudioFormat::new(sample_rate, channels, SampleFormat::I16),
        }
    }

    /// Creates a frame of f32 samples.
    pub fn from_f32(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            payload: SamplePayload::F32(samples),
            format: AudioFormat::new(sample_rate, channels, SampleFormat::F32),
        }
    }

    /// Decodes the payload to f32, leaving channel layout untouched.
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.payload {
            SamplePayload::F32(s) => s.clone(),
            SamplePayload::I16(s) => s.iter().map(|&v| v as f32 / 32_768.0).collect(),
        }
    }
}
