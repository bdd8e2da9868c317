//! Default configuration constants for livecap.

/// Default target audio sample rate in Hz.
///
/// 16kHz is the standard input rate for speech recognition engines and keeps
/// the conversion stage cheap.
pub const SAMPLE_RATE: u32 = 16_000;

/// Default target channel count. Speech engines expect mono input.
pub const CHANNELS: u16 = 1;

/// Default capture gain factor. 1.0 leaves samples untouched.
pub const GAIN: f32 = 1.0;

/// Default number of finalized caption lines kept in history.
pub const MAX_HISTORY: usize = 4;

/// Default minimum interval between forwarded partial transcripts, in
/// milliseconds. Caps downstream churn from noisy recognition engines.
pub const PARTIAL_DEBOUNCE_MS: u64 = 200;

/// Backoff before restarting a failed recognition session, in milliseconds.
pub const RESTART_BACKOFF_MS: u64 = 300;

/// Input chunk size for the FFT resampler.
pub const RESAMPLER_CHUNK: usize = 1024;

/// Capacity of the capture-to-converter frame channel. Frames beyond this
/// are dropped rather than blocking the capture source.
pub const FRAME_BUFFER: usize = 256;

/// Interval between polls of the audio source, in milliseconds.
pub const CAPTURE_POLL_MS: u64 = 10;

/// Consecutive capture failures tolerated before the pipeline gives up on
/// the source and surfaces a status message.
pub const MAX_CONSECUTIVE_CAPTURE_ERRORS: u32 = 10;
