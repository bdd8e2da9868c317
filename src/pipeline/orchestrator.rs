//! Caption pipeline that runs from start until stop.

use crate::audio::converter::{ConverterConfig, FormatConverter};
use crate::audio::source::AudioSource;
use crate::captions::CaptionStore;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::defaults;
use crate::error::Result;
use crate::stt::adapter::TranscriptionAdapter;
use crate::stt::engine::{RecognitionEvent, SpeechEngine};
use crate::translate::dispatcher::TranslationDispatcher;
use crate::translate::engine::Translator;
use crossbeam_channel::{bounded, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for the caption pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sample rate frames are normalized to before recognition.
    pub target_sample_rate: u32,
    /// Channel count frames are normalized to.
    pub target_channels: u16,
    /// Gain applied by the converter.
    pub gain: f32,
    /// Finalized lines kept in history.
    pub max_history: usize,
    /// Minimum interval between forwarded partials.
    pub partial_debounce: Duration,
    /// Backoff before restarting a failed recognition session.
    pub restart_backoff: Duration,
    /// Active target languages; one translation worker per entry.
    pub languages: Vec<String>,
    /// Source language hint for the translation engine.
    pub source_language: Option<String>,
    /// Capacity of the capture-to-converter channel.
    pub frame_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: defaults::SAMPLE_RATE,
            target_channels: defaults::CHANNELS,
            gain: defaults::GAIN,
            max_history: defaults::MAX_HISTORY,
            partial_debounce: Duration::from_millis(defaults::PARTIAL_DEBOUNCE_MS),
            restart_backoff: Duration::from_millis(defaults::RESTART_BACKOFF_MS),
            languages: vec!["english".to_string()],
            source_language: None,
            frame_buffer: defaults::FRAME_BUFFER,
        }
    }
}

impl PipelineConfig {
    /// Builds a pipeline configuration from the loaded config file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_sample_rate: config.audio.sample_rate,
            target_channels: config.audio.channels,
            gain: config.audio.gain,
            max_history: config.captions.max_history,
            partial_debounce: config.partial_debounce(),
            restart_backoff: Duration::from_millis(defaults::RESTART_BACKOFF_MS),
            languages: config.translation.languages.clone(),
            source_language: config.translation.source_language.clone(),
            frame_buffer: defaults::FRAME_BUFFER,
        }
    }
}

/// Handle to a running pipeline.
///
/// Dropping the handle stops the pipeline.
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    stopped: bool,
    threads: Vec<(&'static str, JoinHandle<()>)>,
    adapter: Arc<TranscriptionAdapter>,
    dispatcher: Arc<TranslationDispatcher>,
    store: Arc<CaptionStore>,
}

impl PipelineHandle {
    /// The caption store for presentation-layer polling. Remains readable
    /// after the pipeline stops.
    pub fn store(&self) -> Arc<CaptionStore> {
        self.store.clone()
    }

    /// Returns true until `stop` is called (or an internal shutdown has
    /// been requested).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the pipeline. Idempotent.
    ///
    /// New submissions cease immediately; capture, conversion and
    /// recognition threads are joined, the recognition session is released,
    /// and translation workers drain their queues and are joined. When this
    /// returns, no callback fires and no store mutation occurs anymore;
    /// results of jobs that were still in flight have either been applied
    /// or discarded by the id/sequence checks.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        self.running.store(false, Ordering::SeqCst);

        // Quiesce producers before consumers: capture first, then
        // conversion, then the recognition event loop.
        for (name, handle) in self.threads.drain(..) {
            if handle.join().is_err() {
                tracing::warn!(thread = name, "pipeline thread panicked");
            }
        }

        self.adapter.stop();
        self.dispatcher.shutdown();
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Caption pipeline: AudioSource → FormatConverter → TranscriptionAdapter →
/// CaptionStore + TranslationDispatcher.
pub struct Pipeline {
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    /// Creates a new pipeline with the system clock.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Starts the pipeline.
    ///
    /// # Arguments
    /// * `source` - Audio capture source
    /// * `engine` - Streaming speech engine
    /// * `translator` - Translation engine shared by all language workers
    pub fn start(
        self,
        mut source: Box<dyn AudioSource>,
        engine: Arc<dyn SpeechEngine>,
        translator: Arc<dyn Translator>,
    ) -> Result<PipelineHandle> {
        let config = self.config;
        let running = Arc::new(AtomicBool::new(true));

        let store = Arc::new(CaptionStore::new(config.max_history));
        let dispatcher = Arc::new(TranslationDispatcher::spawn(
            &config.languages,
            translator,
            store.clone(),
            config.source_language.clone(),
        ));
        let converter = Arc::new(FormatConverter::new(ConverterConfig {
            target_sample_rate: config.target_sample_rate,
            target_channels: config.target_channels,
            gain: config.gain,
        }));
        let adapter = Arc::new(TranscriptionAdapter::new(
            engine,
            self.clock.clone(),
            config.partial_debounce,
            config.restart_backoff,
        ));

        // Acquire resources in order: capture, then recognition.
        source.start()?;

        let (event_tx, event_rx) = unbounded::<RecognitionEvent>();
        if let Err(e) = adapter.start(event_tx) {
            let _ = source.stop();
            return Err(e);
        }

        let (frame_tx, frame_rx) = bounded(config.frame_buffer);

        // Capture poll thread. Owns the source and stops it on exit.
        let capture_running = running.clone();
        let capture_store = store.clone();
        let source_is_finite = source.is_finite();
        let capture_handle = thread::spawn(move || {
            let poll_interval = Duration::from_millis(defaults::CAPTURE_POLL_MS);
            let mut consecutive_errors: u32 = 0;

            while capture_running.load(Ordering::SeqCst) {
                match source.read_frame() {
                    Ok(Some(frame)) => {
                        consecutive_errors = 0;
                        // Never block the capture source: drop on full.
                        if frame_tx.try_send(frame).is_err()
                            && !capture_running.load(Ordering::SeqCst)
                        {
                            break;
                        }
                    }
                    Ok(None) => {
                        if source_is_finite {
                            break;
                        }
                        thread::sleep(poll_interval);
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= defaults::MAX_CONSECUTIVE_CAPTURE_ERRORS {
                            tracing::warn!("giving up on audio source: {e}");
                            capture_store.set_status(format!("audio capture failed: {e}"));
                            break;
                        }
                        thread::sleep(poll_interval);
                    }
                }
            }

            if let Err(e) = source.stop() {
                tracing::warn!("audio source stop failed: {e}");
            }
        });

        // Converter thread: normalize frames and feed the adapter.
        let convert_running = running.clone();
        let convert_adapter = adapter.clone();
        let convert_handle = thread::spawn(move || {
            loop {
                if !convert_running.load(Ordering::SeqCst) {
                    break;
                }
                match frame_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(frame) => {
                        if let Some(samples) = converter.convert(frame)
                            && !samples.is_empty()
                        {
                            convert_adapter.append(&samples);
                        }
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        // Recognition event loop: debounce partials, commit finals, drive
        // the restart machine.
        let event_running = running.clone();
        let event_adapter = adapter.clone();
        let event_store = store.clone();
        let event_dispatcher = dispatcher.clone();
        let event_handle = thread::spawn(move || {
            loop {
                if !event_running.load(Ordering::SeqCst) {
                    break;
                }
                match event_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(RecognitionEvent::Partial(text)) => {
                        if let Some(partial) = event_adapter.on_partial(&text) {
                            let seq = event_store.update_partial(&partial);
                            event_dispatcher.submit_partial(&partial, seq);
                        }
                    }
                    Ok(RecognitionEvent::Final(text)) => {
                        if let Some(final_text) = event_adapter.on_final(&text) {
                            let id = event_store.commit_final(&final_text);
                            event_dispatcher.submit_final(id, &final_text);
                        }
                    }
                    Ok(RecognitionEvent::Error(message)) => {
                        tracing::warn!("recognition error: {message}");
                        event_store.set_status(format!("recognition error: {message}; restarting"));
                        if let Err(e) = event_adapter.recover() {
                            tracing::warn!("recognition restart failed: {e}");
                            event_store.set_status(format!("recognition restart failed: {e}"));
                        }
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(PipelineHandle {
            running,
            stopped: false,
            threads: vec![
                ("capture", capture_handle),
                ("convert", convert_handle),
                ("events", event_handle),
            ],
            adapter,
            dispatcher,
            store,
        })
    }
}
