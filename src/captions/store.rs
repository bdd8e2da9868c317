//! Single owner of caption state.
//!
//! Every mutation goes through one internal mutex, so concurrent producers
//! (recognition loop, translation workers) are serialized here and nowhere
//! else. No method blocks on I/O. The presentation layer reads via
//! `version`/`snapshot` only.

use crate::captions::types::{CaptionLine, CaptionSnapshot, LineId, PartialCaption};
use std::collections::VecDeque;
use std::sync::Mutex;

struct StoreState {
    history: VecDeque<CaptionLine>,
    partial: PartialCaption,
    /// Monotonic staleness sequence for partial translations. Advanced by
    /// every partial update, every clear, and every final commit, so a
    /// result carrying an older sequence can never be applied.
    sequence: u64,
    next_id: u64,
    status: Option<String>,
    version: u64,
}

/// Caption state owner: bounded finalized history + current partial line.
pub struct CaptionStore {
    max_history: usize,
    state: Mutex<StoreState>,
}

impl CaptionStore {
    /// Creates a store holding at most `max_history` finalized lines
    /// (clamped to at least 1).
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            state: Mutex::new(StoreState {
                history: VecDeque::new(),
                partial: PartialCaption::default(),
                sequence: 0,
                next_id: 1,
                status: None,
                version: 0,
            }),
        }
    }

    /// Commits a finalized transcript as a new caption line.
    ///
    /// Allocates a fresh id, evicts the oldest lines beyond `max_history`,
    /// clears the partial caption, and advances the staleness sequence so
    /// in-flight partial translations cannot resurrect cleared text.
    pub fn commit_final(&self, text: &str) -> LineId {
        let mut state = self.lock();
        let id = LineId(state.next_id);
        state.next_id += 1;

        state.history.push_back(CaptionLine::new(id, text.to_string()));
        while state.history.len() > self.max_history {
            state.history.pop_front();
        }

        state.partial = PartialCaption::default();
        state.sequence += 1;
        state.version += 1;
        id
    }

    /// Overwrites the partial caption's original text in place.
    ///
    /// Returns the new staleness sequence; the caller passes it along with
    /// any translation job submitted for this text.
    pub fn update_partial(&self, text: &str) -> u64 {
        let mut state = self.lock();
        state.sequence += 1;
        state.partial.original = text.to_string();
        state.version += 1;
        state.sequence
    }

    /// Applies a finished translation to a finalized line.
    ///
    /// A result for an id that has already been evicted is a no-op: the
    /// line is gone from the UI and resurrecting it would unbound memory.
    pub fn apply_translation(&self, id: LineId, language: &str, text: &str) {
        let mut guard = self.lock();
        let state = &mut *guard;
        match state.history.iter_mut().find(|line| line.id == id) {
            Some(line) => {
                line.translations.insert(language.to_string(), text.to_string());
                state.version += 1;
            }
            None => {
                tracing::debug!(%id, language, "translation for evicted line, dropping");
            }
        }
    }

    /// Applies a partial translation if its sequence is still current.
    ///
    /// A result carrying an older sequence has been superseded by a newer
    /// partial (or a clear, or a commit) and is dropped silently. This
    /// check is the load-bearing staleness gate: translation latency can
    /// exceed the debounce interval, so a job valid at submission may
    /// resolve after it has been superseded.
    pub fn apply_partial_translation(&self, language: &str, text: &str, sequence: u64) {
        let mut state = self.lock();
        if sequence != state.sequence {
            tracing::debug!(
                language,
                sequence,
                latest = state.sequence,
                "stale partial translation, dropping"
            );
            return;
        }
        state.partial.translations.insert(language.to_string(), text.to_string());
        state.version += 1;
    }

    /// Blanks all partial translation fields and advances the staleness
    /// sequence without enqueueing work: any in-flight partial job becomes
    /// unappliable on arrival.
    pub fn clear_partial_translations(&self) {
        let mut state = self.lock();
        state.sequence += 1;
        state.partial.translations.clear();
        state.version += 1;
    }

    /// Publishes a human-readable status message (engine restarts,
    /// translation failures). Overwrites the previous message.
    pub fn set_status(&self, message: impl Into<String>) {
        let mut state = self.lock();
        state.status = Some(message.into());
        state.version += 1;
    }

    /// Current staleness sequence for partial translations.
    pub fn latest_sequence(&self) -> u64 {
        self.lock().sequence
    }

    /// Version counter, bumped on every visible mutation.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Full read-only snapshot for the presentation layer.
    pub fn snapshot(&self) -> CaptionSnapshot {
        let state = self.lock();
        CaptionSnapshot {
            history: state.history.iter().cloned().collect(),
            partial: state.partial.clone(),
            status: state.status.clone(),
            version: state.version,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // A poisoned lock still holds structurally valid caption state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
