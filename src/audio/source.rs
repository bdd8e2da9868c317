//! Capture source seam.

use crate::audio::frame::AudioFrame;
use crate::error::{LivecapError, Result};
use std::collections::VecDeque;

/// Trait for audio capture sources.
///
/// Sources deliver frames at indeterminate rate and timing; each frame
/// carries its own format, which may change mid-stream (e.g. on a device
/// switch). This trait allows swapping implementations (real device, WAV
/// file, mock).
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source. Must be idempotent.
    fn stop(&mut self) -> Result<()>;

    /// Read the next available frame.
    ///
    /// Returns `Ok(None)` when no data is currently available. For finite
    /// sources this means the source is exhausted; for live sources the
    /// caller should poll again.
    fn read_frame(&mut self) -> Result<Option<AudioFrame>>;

    /// Whether this source ends on its own (file or pipe) rather than
    /// producing data until stopped (microphone).
    fn is_finite(&self) -> bool {
        false
    }
}

/// Mock audio source for testing
pub struct MockAudioSource {
    is_started: bool,
    frames: VecDeque<AudioFrame>,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with no queued frames
    pub fn new() -> Self {
        Self {
            is_started: false,
            frames: VecDeque::new(),
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock capture error".to_string(),
        }
    }

    /// Queue frames for the mock to deliver in order
    pub fn with_frames(mut self, frames: Vec<AudioFrame>) -> Self {
        self.frames = frames.into();
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on every read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(LivecapError::Capture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<AudioFrame>> {
        if self.should_fail_read {
            return Err(LivecapError::Capture {
                message: self.error_message.clone(),
            });
        }
        Ok(self.frames.pop_front())
    }

    fn is_finite(&self) -> bool {
        true
    }
}
