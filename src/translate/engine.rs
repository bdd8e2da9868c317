//! Translation engine seam.

use crate::error::{LivecapError, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for text translation engines.
///
/// One call per job; calls may take arbitrarily long and fail per call.
/// This trait allows swapping implementations (real service vs mock).
pub trait Translator: Send + Sync {
    /// Translates `text` into `target_language`.
    ///
    /// `source_language` is a hint; `None` lets the engine detect it.
    fn translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String>;

    /// Engine name for logging and status messages.
    fn name(&self) -> &str;
}

/// Mock translator for testing.
///
/// By default returns `"{target}:{text}"`. Specific inputs can be scripted
/// to fail or to return fixed responses, and an artificial delay can
/// simulate slow services outliving the debounce interval.
pub struct MockTranslator {
    responses: Mutex<HashMap<String, String>>,
    fail_on: Mutex<Vec<String>>,
    delay: Duration,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            fail_on: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Script a fixed response for a given input text (any language).
    pub fn with_response(self, input: &str, output: &str) -> Self {
        self.responses
            .lock()
            .expect("mock lock")
            .insert(input.to_string(), output.to_string());
        self
    }

    /// Script a failure for a given input text.
    pub fn with_failure_on(self, input: &str) -> Self {
        self.fail_on.lock().expect("mock lock").push(input.to_string());
        self
    }

    /// Add a fixed delay to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for MockTranslator {
    fn translate(
        &self,
        text: &str,
        _source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail_on.lock().expect("mock lock").iter().any(|t| t == text) {
            return Err(LivecapError::Translation {
                language: target_language.to_string(),
                message: "mock translation failure".to_string(),
            });
        }
        if let Some(scripted) = self.responses.lock().expect("mock lock").get(text) {
            return Ok(scripted.clone());
        }
        Ok(format!("{target_language}:{text}"))
    }

    fn name(&self) -> &str {
        "mock-translate"
    }
}
