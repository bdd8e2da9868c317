//! WAV-file backed audio source.
//!
//! Useful for offline runs and integration tests: delivers the file's
//! samples in ~100ms frames carrying the file's native format, exactly as a
//! live source would.

use crate::audio::frame::{AudioFrame, SamplePayload};
use crate::audio::source::AudioSource;
use crate::error::{LivecapError, Result};
use std::path::Path;

/// Finite audio source reading a RIFF WAV file.
#[derive(Debug)]
pub struct WavFileSource {
    payload: SamplePayload,
    sample_rate: u32,
    channels: u16,
    position: usize,
    frame_samples: usize,
    is_started: bool,
}

impl WavFileSource {
    /// Opens a WAV file and decodes it eagerly.
    ///
    /// Supports 16-bit integer and 32-bit float PCM.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path).map_err(|e| LivecapError::Capture {
            message: format!("failed to open WAV {}: {e}", path.display()),
        })?;
        let spec = reader.spec();

        let payload = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 16) => {
                let samples: std::result::Result<Vec<i16>, _> = reader.samples::<i16>().collect();
                SamplePayload::I16(samples.map_err(|e| LivecapError::Capture {
                    message: format!("failed to decode WAV samples: {e}"),
                })?)
            }
            (hound::SampleFormat::Float, 32) => {
                let samples: std::result::Result<Vec<f32>, _> = reader.samples::<f32>().collect();
                SamplePayload::F32(samples.map_err(|e| LivecapError::Capture {
                    message: format!("failed to decode WAV samples: {e}"),
                })?)
            }
            (format, bits) => {
                return Err(LivecapError::Capture {
                    message: format!("unsupported WAV format: {format:?} {bits}-bit"),
                });
            }
        };

        // ~100ms of interleaved samples per frame.
        let frame_samples = (spec.sample_rate as usize / 10).max(1) * spec.channels as usize;

        Ok(Self {
            payload,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            position: 0,
            frame_samples,
            is_started: false,
        })
    }

    fn slice_frame(&mut self) -> Option<AudioFrame> {
        let total = self.payload.len();
        if self.position >= total {
            return None;
        }
        let end = (self.position + self.frame_samples).min(total);
        let frame = match &self.payload {
            SamplePayload::I16(samples) => AudioFrame::from_i16(
                samples[self.position..end].to_vec(),
                self.sample_rate,
                self.channels,
            ),
            SamplePayload::F32(samples) => AudioFrame::from_f32(
                samples[self.position..end].to_vec(),
                self.sample_rate,
                self.channels,
            ),
        };
        self.position = end;
        Some(frame)
    }
}

impl AudioSource for WavFileSource {
    fn start(&mut self) -> Result<()> {
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<AudioFrame>> {
        if !self.is_started {
            return Ok(None);
        }
        Ok(self.slice_frame())
    }

    fn is_finite(&self) -> bool {
        true
    }
}
