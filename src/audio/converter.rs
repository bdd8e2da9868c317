//! Format conversion for captured audio.
//!
//! Normalizes frames of arbitrary sample rate, channel count and encoding to
//! the pipeline's target format, then applies gain with a saturating clamp.
//! Conversion failures drop the frame; they are too frequent to be
//! individually actionable and must never stall the capture hot path.

use crate::audio::frame::{AudioFormat, AudioFrame};
use crate::defaults;
use rubato::{FftFixedIn, Resampler};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Target format and gain for the converter.
#[derive(Debug, Clone, Copy)]
pub struct ConverterConfig {
    /// Sample rate frames are resampled to.
    pub target_sample_rate: u32,
    /// Channel count frames are downmixed to (mono for speech engines).
    pub target_channels: u16,
    /// Gain factor applied to every sample.
    pub gain: f32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: defaults::SAMPLE_RATE,
            target_channels: defaults::CHANNELS,
            gain: defaults::GAIN,
        }
    }
}

/// Resampler cached for the last-seen input format.
///
/// The carry buffer holds input samples that did not fill a whole resampler
/// chunk; they are consumed by the next frame of the same format.
struct CachedResampler {
    key: AudioFormat,
    resampler: FftFixedIn<f32>,
    carry: Vec<f32>,
}

/// Converts captured frames to the target format and applies gain.
///
/// Holds exactly one cached resampler, rebuilt whenever the input format
/// changes, including alternating back to a previously-seen format. The
/// cache mutex is the only lock and is never held across a blocking call.
pub struct FormatConverter {
    config: ConverterConfig,
    cache: Mutex<Option<CachedResampler>>,
    rebuilds: AtomicU64,
}

impl FormatConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(None),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Converts one frame to target-rate samples with gain applied.
    ///
    /// Returns `None` when the frame cannot be converted; the caller drops
    /// it and moves on. Output may be shorter than the input implies while
    /// the resampler accumulates a full chunk.
    pub fn convert(&self, frame: AudioFrame) -> Option<Vec<f32>> {
        if frame.payload.is_empty() || frame.format.channels == 0 {
            return None;
        }

        let downmixed = self.downmix(&frame)?;

        let mut samples = if frame.format.sample_rate == self.config.target_sample_rate {
            downmixed
        } else {
            self.resample(frame.format, downmixed)?
        };

        let gain = self.config.gain;
        for sample in &mut samples {
            *sample = (*sample * gain).clamp(-1.0, 1.0);
        }

        Some(samples)
    }

    /// Number of resampler rebuilds since construction. Each input format
    /// change costs one rebuild; a stable stream costs at most one.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    fn downmix(&self, frame: &AudioFrame) -> Option<Vec<f32>> {
        let channels = frame.format.channels;
        let decoded = frame.to_f32();

        if channels == self.config.target_channels {
            return Some(decoded);
        }

        // Only mono targets are supported for mismatched layouts; speech
        // engines take mono and upmixing has no use here.
        if self.config.target_channels != 1 {
            tracing::debug!(
                input_channels = channels,
                target_channels = self.config.target_channels,
                "unsupported channel layout, dropping frame"
            );
            return None;
        }

        let channels = channels as usize;
        let mono = decoded
            .chunks_exact(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect();
        Some(mono)
    }

    fn resample(&self, format: AudioFormat, input: Vec<f32>) -> Option<Vec<f32>> {
        let mut cache = self.cache.lock().ok()?;

        let needs_rebuild = match cache.as_ref() {
            Some(cached) => cached.key != format,
            None => true,
        };

        if needs_rebuild {
            let resampler = match FftFixedIn::<f32>::new(
                format.sample_rate as usize,
                self.config.target_sample_rate as usize,
                defaults::RESAMPLER_CHUNK,
                1,
                1,
            ) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("resampler construction failed: {e}, dropping frame");
                    return None;
                }
            };
            *cache = Some(CachedResampler {
                key: format,
                resampler,
                carry: Vec::with_capacity(defaults::RESAMPLER_CHUNK),
            });
            self.rebuilds.fetch_add(1, Ordering::Relaxed);
        }

        let cached = cache.as_mut()?;
        cached.carry.extend_from_slice(&input);

        let mut output = Vec::new();
        while cached.carry.len() >= defaults::RESAMPLER_CHUNK {
            let chunk: Vec<f32> = cached.carry.drain(..defaults::RESAMPLER_CHUNK).collect();
            match cached.resampler.process(&[&chunk[..]], None) {
                Ok(resampled) => output.extend_from_slice(&resampled[0]),
                Err(e) => {
                    tracing::debug!("resampling failed: {e}, dropping frame");
                    // Cached state may be mid-stream inconsistent; force a
                    // rebuild on the next frame.
                    *cache = None;
                    return None;
                }
            }
        }

        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(gain: f32) -> FormatConverter {
        FormatConverter::new(ConverterConfig {
            target_sample_rate: 16_000,
            target_channels: 1,
            gain,
        })
    }

    #[test]
    fn test_same_format_applies_gain_only() {
        let converter = converter(2.0);
        let frame = AudioFrame::from_f32(vec![0.1, -0.2, 0.3], 16_000, 1);
        let out = converter.convert(frame).expect("conversion");
        assert_eq!(out.len(), 3);
        assert!((out[0] - 0.2).abs() < 1e-6);
        assert!((out[1] - -0.4).abs() < 1e-6);
        assert!((out[2] - 0.6).abs() < 1e-6);
        assert_eq!(converter.rebuild_count(), 0);
    }

    #[test]
    fn test_gain_clamps_saturating() {
        let converter = converter(2.0);
        let frame = AudioFrame::from_f32(vec![0.9, -0.9], 16_000, 1);
        let out = converter.convert(frame).expect("conversion");
        assert_eq!(out, vec![1.0, -1.0]);
    }

    #[test]
    fn test_stereo_downmix_averages_channels() {
        let converter = converter(1.0);
        let frame = AudioFrame::from_f32(vec![0.2, 0.4, -0.6, -0.2], 16_000, 2);
        let out = converter.convert(frame).expect("conversion");
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[1] - -0.4).abs() < 1e-6);
    }

    #[test]
    fn test_i16_payload_is_decoded() {
        let converter = converter(1.0);
        let frame = AudioFrame::from_i16(vec![16_384, -16_384], 16_000, 1);
        let out = converter.convert(frame).expect("conversion");
        assert!((out[0] - 0.5).abs() < 1e-3);
        assert!((out[1] - -0.5).abs() < 1e-3);
    }

    #[test]
    fn test_empty_frame_is_dropped() {
        let converter = converter(1.0);
        let frame = AudioFrame::from_f32(vec![], 16_000, 1);
        assert!(converter.convert(frame).is_none());
    }

    #[test]
    fn test_resample_produces_target_rate_output() {
        let converter = converter(1.0);
        // 2048 samples at 32kHz resample to roughly 1024 at 16kHz.
        let frame = AudioFrame::from_f32(vec![0.1; 2048], 32_000, 1);
        let out = converter.convert(frame).expect("conversion");
        assert!(
            (out.len() as i64 - 1024).abs() <= 128,
            "unexpected output length {}",
            out.len()
        );
        assert_eq!(converter.rebuild_count(), 1);
    }

    #[test]
    fn test_stable_format_reuses_resampler() {
        let converter = converter(1.0);
        for _ in 0..3 {
            let frame = AudioFrame::from_f32(vec![0.0; 2048], 48_000, 1);
            converter.convert(frame).expect("conversion");
        }
        assert_eq!(converter.rebuild_count(), 1);
    }

    #[test]
    fn test_alternating_formats_rebuild_every_time() {
        let converter = converter(1.0);
        let format_a = || AudioFrame::from_f32(vec![0.0; 2048], 48_000, 1);
        let format_b = || AudioFrame::from_f32(vec![0.0; 2048], 44_100, 1);

        converter.convert(format_a()).expect("conversion");
        converter.convert(format_b()).expect("conversion");
        converter.convert(format_a()).expect("conversion");

        // A, B, A: no stale reuse across the alternation.
        assert_eq!(converter.rebuild_count(), 3);
    }

    #[test]
    fn test_short_frames_accumulate_in_carry() {
        let converter = converter(1.0);
        // Below one resampler chunk: no output yet, but not an error.
        let frame = AudioFrame::from_f32(vec![0.0; 100], 48_000, 1);
        let out = converter.convert(frame).expect("conversion");
        assert!(out.is_empty());

        // Enough accumulated input eventually produces output.
        let frame = AudioFrame::from_f32(vec![0.0; 2048], 48_000, 1);
        let out = converter.convert(frame).expect("conversion");
        assert!(!out.is_empty());
    }
}
