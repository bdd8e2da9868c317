//! Adapter around a streaming speech engine.
//!
//! Debounces noisy partial output, forwards finals, and keeps the pipeline
//! alive across engine failures: a dead session is torn down, a fixed
//! backoff elapses, and a fresh session is started. Audio appended during
//! the gap is queued, not lost.

use crate::clock::Clock;
use crate::error::{LivecapError, Result};
use crate::stt::engine::{RecognitionEvent, SpeechEngine, SpeechSession};
use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Lifecycle state of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// No session; audio is discarded.
    Idle,
    /// Session live; audio flows to the engine.
    Running,
    /// Session died; audio queues until a new session is ready.
    Restarting,
}

struct AdapterInner {
    state: AdapterState,
    session: Option<Box<dyn SpeechSession>>,
    event_tx: Option<Sender<RecognitionEvent>>,
    /// Audio buffered while no session is available.
    pending: Vec<Vec<f32>>,
    /// Last partial text seen, forwarded or not. A repeat of this text is
    /// never forwarded again.
    last_seen_text: Option<String>,
    /// When the last partial was forwarded downstream.
    last_forward_at: Option<Instant>,
}

/// Wraps a `SpeechEngine` with debounce and restart handling.
pub struct TranscriptionAdapter {
    engine: Arc<dyn SpeechEngine>,
    clock: Arc<dyn Clock>,
    debounce: Duration,
    backoff: Duration,
    inner: Mutex<AdapterInner>,
}

impl TranscriptionAdapter {
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        clock: Arc<dyn Clock>,
        debounce: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            engine,
            clock,
            debounce,
            backoff,
            inner: Mutex::new(AdapterInner {
                state: AdapterState::Idle,
                session: None,
                event_tx: None,
                pending: Vec::new(),
                last_seen_text: None,
                last_forward_at: None,
            }),
        }
    }

    /// Starts a recognition session emitting onto `event_tx`.
    ///
    /// A no-op when already running.
    pub fn start(&self, event_tx: Sender<RecognitionEvent>) -> Result<()> {
        let mut inner = self.lock();
        if inner.state == AdapterState::Running {
            return Ok(());
        }
        let session = self.engine.start_session(event_tx.clone())?;
        inner.session = Some(session);
        inner.event_tx = Some(event_tx);
        inner.state = AdapterState::Running;
        inner.pending.clear();
        inner.last_seen_text = None;
        inner.last_forward_at = None;
        Ok(())
    }

    /// Feeds normalized audio to the engine.
    ///
    /// Never fails from the caller's perspective: a dead session flips the
    /// adapter to `Restarting`, queues the audio, and raises an `Error`
    /// event so the consumer loop performs the restart.
    ///
    /// Called from a single feeder thread. The session is checked out of
    /// the lock for the engine call, which may suspend; `on_partial`,
    /// `on_final` and `stop` stay responsive meanwhile.
    pub fn append(&self, samples: &[f32]) {
        let mut session = {
            let mut inner = self.lock();
            match inner.state {
                AdapterState::Idle => return,
                AdapterState::Restarting => {
                    inner.pending.push(samples.to_vec());
                    return;
                }
                AdapterState::Running => match inner.session.take() {
                    Some(session) => session,
                    None => {
                        let err = LivecapError::Recognition {
                            message: "no active session".to_string(),
                        };
                        inner.state = AdapterState::Restarting;
                        inner.pending.push(samples.to_vec());
                        if let Some(tx) = &inner.event_tx {
                            let _ = tx.send(RecognitionEvent::Error(err.to_string()));
                        }
                        return;
                    }
                },
            }
        };

        let result = session.append(samples);

        let mut inner = self.lock();
        if inner.state != AdapterState::Running {
            // Stopped while the engine call was in flight.
            session.finish();
            return;
        }
        match result {
            Ok(()) => {
                if inner.session.is_none() {
                    inner.session = Some(session);
                } else {
                    // A recovery installed a fresh session in the meantime.
                    session.finish();
                }
            }
            Err(err) => {
                session.finish();
                inner.state = AdapterState::Restarting;
                inner.pending.push(samples.to_vec());
                if let Some(tx) = &inner.event_tx {
                    let _ = tx.send(RecognitionEvent::Error(err.to_string()));
                }
            }
        }
    }

    /// Debounces a partial transcript.
    ///
    /// Returns the text to forward, or `None` when suppressed: empty after
    /// trimming, repeated since the last partial, or inside the debounce
    /// interval since the last forward.
    pub fn on_partial(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut inner = self.lock();
        let now = self.clock.now();
        let interval_ok = inner
            .last_forward_at
            .is_none_or(|at| now.duration_since(at) >= self.debounce);
        let changed = inner.last_seen_text.as_deref() != Some(trimmed);
        inner.last_seen_text = Some(trimmed.to_string());

        if interval_ok && changed {
            inner.last_forward_at = Some(now);
            Some(trimmed.to_string())
        } else {
            None
        }
    }

    /// Handles a final transcript: resets debounce state so the next
    /// utterance starts fresh, then forwards unconditionally unless empty
    /// after trimming.
    pub fn on_final(&self, text: &str) -> Option<String> {
        let mut inner = self.lock();
        inner.last_seen_text = None;
        inner.last_forward_at = None;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Recovers from an engine error: waits the backoff, starts a new
    /// session, and flushes audio queued in the meantime.
    ///
    /// Called by the event consumer loop on an `Error` event. A no-op when
    /// the adapter was stopped in the meantime.
    pub fn recover(&self) -> Result<()> {
        let event_tx = {
            let mut inner = self.lock();
            if inner.state == AdapterState::Idle {
                return Ok(());
            }
            if let Some(mut session) = inner.session.take() {
                session.finish();
            }
            inner.state = AdapterState::Restarting;
            inner.event_tx.clone().ok_or_else(|| LivecapError::Recognition {
                message: "adapter was never started".to_string(),
            })?
        };

        std::thread::sleep(self.backoff);

        let mut session = self.engine.start_session(event_tx)?;

        let mut inner = self.lock();
        if inner.state != AdapterState::Restarting {
            // Stopped during the backoff; discard the fresh session.
            session.finish();
            inner.pending.clear();
            return Ok(());
        }

        for buffered in inner.pending.drain(..) {
            if let Err(err) = session.append(&buffered) {
                tracing::warn!("replay into new session failed: {err}");
                break;
            }
        }
        inner.session = Some(session);
        inner.state = AdapterState::Running;
        Ok(())
    }

    /// Stops the adapter and releases the session. Valid from any state,
    /// idempotent.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.state = AdapterState::Idle;
        if let Some(mut session) = inner.session.take() {
            session.finish();
        }
        inner.pending.clear();
        inner.event_tx = None;
    }

    pub fn state(&self) -> AdapterState {
        self.lock().state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AdapterInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
