//! Streaming speech engine seam.
//!
//! The engine's assumed (not enforced) contract per utterance: zero or more
//! partial results, then exactly one final result. Events arrive on the
//! engine's own execution context over a channel.

use crate::error::{LivecapError, Result};
use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One tagged recognition event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// In-progress transcript for the current utterance.
    Partial(String),
    /// Completed transcript for one utterance.
    Final(String),
    /// Recoverable engine failure; the session is dead.
    Error(String),
}

/// Trait for streaming speech engines.
///
/// This trait allows swapping implementations (real engine vs mock).
pub trait SpeechEngine: Send + Sync {
    /// Starts a recognition session that emits events on `events`.
    fn start_session(&self, events: Sender<RecognitionEvent>) -> Result<Box<dyn SpeechSession>>;

    /// Engine name for logging and status messages.
    fn name(&self) -> &str;
}

/// One live recognition session.
pub trait SpeechSession: Send {
    /// Appends normalized mono samples at the pipeline's target rate.
    ///
    /// May suspend but must not block indefinitely; a failure here means
    /// the session is unusable and triggers the adapter's restart machine.
    fn append(&mut self, samples: &[f32]) -> Result<()>;

    /// Finishes the session and releases engine resources. Idempotent.
    fn finish(&mut self);
}

#[derive(Default)]
struct MockEngineState {
    sessions_started: u64,
    appended_samples: usize,
    active_session: u64,
    active_tx: Option<Sender<RecognitionEvent>>,
    fail_next_append: bool,
    fail_start: bool,
    append_delay: Duration,
}

/// Mock speech engine for testing.
///
/// Records appended audio and lets the test emit events into the currently
/// active session as if the engine had produced them.
#[derive(Clone, Default)]
pub struct MockSpeechEngine {
    state: Arc<Mutex<MockEngineState>>,
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits an event from the active session, as the engine would.
    ///
    /// Returns false if no session is active or the consumer is gone.
    pub fn emit(&self, event: RecognitionEvent) -> bool {
        let state = self.state.lock().expect("mock lock");
        match &state.active_tx {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Makes the next `append` call fail, as a dying session would.
    pub fn fail_next_append(&self) {
        self.state.lock().expect("mock lock").fail_next_append = true;
    }

    /// Makes `start_session` fail until cleared.
    pub fn set_fail_start(&self, fail: bool) {
        self.state.lock().expect("mock lock").fail_start = fail;
    }

    /// Adds a fixed delay to every `append`, as a slow engine would.
    pub fn set_append_delay(&self, delay: Duration) {
        self.state.lock().expect("mock lock").append_delay = delay;
    }

    /// Number of sessions started so far.
    pub fn sessions_started(&self) -> u64 {
        self.state.lock().expect("mock lock").sessions_started
    }

    /// Total samples appended across all sessions.
    pub fn appended_samples(&self) -> usize {
        self.state.lock().expect("mock lock").appended_samples
    }

    /// Whether a session is currently active.
    pub fn session_active(&self) -> bool {
        self.state.lock().expect("mock lock").active_tx.is_some()
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn start_session(&self, events: Sender<RecognitionEvent>) -> Result<Box<dyn SpeechSession>> {
        let mut state = self.state.lock().expect("mock lock");
        if state.fail_start {
            return Err(LivecapError::Recognition {
                message: "mock engine refused to start".to_string(),
            });
        }
        state.sessions_started += 1;
        state.active_session = state.sessions_started;
        state.active_tx = Some(events);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
            session: state.sessions_started,
            finished: false,
        }))
    }

    fn name(&self) -> &str {
        "mock-speech"
    }
}

struct MockSession {
    state: Arc<Mutex<MockEngineState>>,
    session: u64,
    finished: bool,
}

impl SpeechSession for MockSession {
    fn append(&mut self, samples: &[f32]) -> Result<()> {
        let delay = {
            let mut state = self.state.lock().expect("mock lock");
            if state.fail_next_append {
                state.fail_next_append = false;
                return Err(LivecapError::Recognition {
                    message: "mock session lost".to_string(),
                });
            }
            state.append_delay
        };
        // Sleep without the lock so the test can observe progress.
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.state.lock().expect("mock lock").appended_samples += samples.len();
        Ok(())
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            let mut state = self.state.lock().expect("mock lock");
            // Only deactivate if a newer session has not replaced this one.
            if state.active_session == self.session {
                state.active_tx = None;
            }
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_mock_engine_records_appends() {
        let engine = MockSpeechEngine::new();
        let (tx, _rx) = unbounded();
        let mut session = engine.start_session(tx).expect("session");
        session.append(&[0.0; 160]).expect("append");
        session.append(&[0.0; 40]).expect("append");
        assert_eq!(engine.appended_samples(), 200);
        assert_eq!(engine.sessions_started(), 1);
    }

    #[test]
    fn test_mock_engine_emits_to_consumer() {
        let engine = MockSpeechEngine::new();
        let (tx, rx) = unbounded();
        let _session = engine.start_session(tx).expect("session");

        assert!(engine.emit(RecognitionEvent::Partial("hel".to_string())));
        assert_eq!(rx.recv().expect("event"), RecognitionEvent::Partial("hel".to_string()));
    }

    #[test]
    fn test_mock_engine_fail_next_append_is_one_shot() {
        let engine = MockSpeechEngine::new();
        let (tx, _rx) = unbounded();
        let mut session = engine.start_session(tx).expect("session");

        engine.fail_next_append();
        assert!(session.append(&[0.0; 10]).is_err());
        assert!(session.append(&[0.0; 10]).is_ok());
    }

    #[test]
    fn test_finish_deactivates_session() {
        let engine = MockSpeechEngine::new();
        let (tx, _rx) = unbounded();
        let mut session = engine.start_session(tx).expect("session");
        assert!(engine.session_active());
        session.finish();
        assert!(!engine.session_active());
        assert!(!engine.emit(RecognitionEvent::Final("gone".to_string())));
    }

    #[test]
    fn test_start_failure() {
        let engine = MockSpeechEngine::new();
        engine.set_fail_start(true);
        let (tx, _rx) = unbounded();
        assert!(engine.start_session(tx).is_err());
        engine.set_fail_start(false);
        let (tx, _rx) = unbounded();
        assert!(engine.start_session(tx).is_ok());
    }
}
