//! Per-language translation fan-out.
//!
//! One worker thread per active target language, each draining an unbounded
//! FIFO of jobs in submission order, one translation call per job. Workers
//! never block each other and submission never blocks the producer.
//! Staleness is adjudicated when the result is applied to the store, not at
//! submission or dispatch time, because translation latency can exceed the
//! debounce interval.

use crate::captions::{CaptionStore, LineId};
use crate::translate::engine::Translator;
use crossbeam_channel::{Sender, unbounded};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// One unit of translation work.
#[derive(Debug, Clone)]
pub struct TranslationJob {
    /// Owning finalized line; `None` means the current partial caption.
    pub id: Option<LineId>,
    pub text: String,
    pub partial: bool,
    /// Staleness sequence captured at submission time. Unused (0) for
    /// finalized lines, which are keyed by id instead.
    pub seq: u64,
}

struct LanguageWorker {
    language: String,
    tx: Sender<TranslationJob>,
    handle: JoinHandle<()>,
}

/// Fans caption text out to one worker per active target language.
pub struct TranslationDispatcher {
    workers: Mutex<Vec<LanguageWorker>>,
}

impl TranslationDispatcher {
    /// Spawns one worker per language. The active set may be any subset of
    /// supported languages, including a single entry.
    pub fn spawn(
        languages: &[String],
        translator: Arc<dyn Translator>,
        store: Arc<CaptionStore>,
        source_language: Option<String>,
    ) -> Self {
        let workers = languages
            .iter()
            .map(|language| {
                let (tx, rx) = unbounded::<TranslationJob>();
                let language = language.clone();
                let worker_language = language.clone();
                let translator = translator.clone();
                let store = store.clone();
                let source = source_language.clone();

                let handle = std::thread::spawn(move || {
                    // Drains until all senders are dropped, then exits.
                    while let Ok(job) = rx.recv() {
                        let result = translator.translate(
                            &job.text,
                            source.as_deref(),
                            &worker_language,
                        );
                        match result {
                            Ok(translated) => {
                                if job.partial {
                                    store.apply_partial_translation(
                                        &worker_language,
                                        &translated,
                                        job.seq,
                                    );
                                } else if let Some(id) = job.id {
                                    store.apply_translation(id, &worker_language, &translated);
                                }
                            }
                            Err(err) => {
                                tracing::warn!(
                                    language = %worker_language,
                                    "translation failed: {err}"
                                );
                                store.set_status(format!(
                                    "translation ({worker_language}) failed: {err}"
                                ));
                            }
                        }
                    }
                });

                LanguageWorker {
                    language,
                    tx,
                    handle,
                }
            })
            .collect();

        Self {
            workers: Mutex::new(workers),
        }
    }

    /// Enqueues a finalized line to every active worker.
    ///
    /// A no-op after `shutdown`.
    pub fn submit_final(&self, id: LineId, text: &str) {
        self.submit(TranslationJob {
            id: Some(id),
            text: text.to_string(),
            partial: false,
            seq: 0,
        });
    }

    /// Enqueues partial text with its staleness sequence to every active
    /// worker. The sequence comes from `CaptionStore::update_partial`.
    pub fn submit_partial(&self, text: &str, seq: u64) {
        self.submit(TranslationJob {
            id: None,
            text: text.to_string(),
            partial: true,
            seq,
        });
    }

    /// Active language names, in worker order.
    pub fn languages(&self) -> Vec<String> {
        self.lock().iter().map(|w| w.language.clone()).collect()
    }

    /// Closes all queues and joins all workers. Queued jobs are drained
    /// before the workers exit. Idempotent.
    pub fn shutdown(&self) {
        let workers = std::mem::take(&mut *self.lock());
        // Dropping the senders disconnects each queue; workers finish
        // their remaining jobs and exit.
        for worker in workers {
            let LanguageWorker {
                language,
                tx,
                handle,
            } = worker;
            drop(tx);
            if handle.join().is_err() {
                tracing::warn!(language = %language, "translation worker panicked");
            }
        }
    }

    fn submit(&self, job: TranslationJob) {
        for worker in self.lock().iter() {
            // Unbounded queue: never blocks. Send fails only after
            // shutdown, which makes submission a no-op by design.
            let _ = worker.tx.send(job.clone());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LanguageWorker>> {
        self.workers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for TranslationDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
