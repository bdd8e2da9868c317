//! End-to-end pipeline tests with mock capture, recognition and translation.

use livecap::audio::frame::AudioFrame;
use livecap::audio::source::MockAudioSource;
use livecap::clock::MockClock;
use livecap::stt::engine::{MockSpeechEngine, RecognitionEvent};
use livecap::translate::engine::MockTranslator;
use livecap::{Pipeline, PipelineConfig, PipelineHandle};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn wait_until(deadline_ms: u64, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(deadline_ms);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        max_history: 2,
        partial_debounce: Duration::from_millis(200),
        restart_backoff: Duration::from_millis(5),
        languages: vec!["english".to_string()],
        ..PipelineConfig::default()
    }
}

fn start(
    source: MockAudioSource,
    engine: MockSpeechEngine,
    clock: Arc<MockClock>,
) -> PipelineHandle {
    Pipeline::new(test_config())
        .with_clock(clock)
        .start(
            Box::new(source),
            Arc::new(engine),
            Arc::new(MockTranslator::new()),
        )
        .expect("pipeline start")
}

#[test]
fn test_partial_then_final_produces_one_translated_line() {
    let engine = MockSpeechEngine::new();
    let clock = Arc::new(MockClock::new());
    let source = MockAudioSource::new()
        .with_frames(vec![AudioFrame::from_f32(vec![0.1; 1600], 16_000, 1)]);
    let mut handle = start(source, engine.clone(), clock);
    let store = handle.store();

    assert!(wait_until(1000, || engine.session_active()));
    assert!(wait_until(1000, || engine.appended_samples() == 1600));

    // First partial is forwarded and becomes the visible partial line.
    assert!(engine.emit(RecognitionEvent::Partial("hel".to_string())));
    assert!(wait_until(1000, || store.snapshot().partial.original == "hel"));

    // A second partial inside the debounce window is suppressed; the
    // visible partial keeps its previous text.
    assert!(engine.emit(RecognitionEvent::Partial("hello".to_string())));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(store.snapshot().partial.original, "hel");

    // The final commits exactly one history line and clears the partial.
    assert!(engine.emit(RecognitionEvent::Final("hello world".to_string())));
    assert!(wait_until(1000, || store.snapshot().history.len() == 1));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.history[0].original, "hello world");
    assert!(snapshot.partial.original.is_empty());
    assert!(snapshot.partial.translations.is_empty());

    // The translation lands on the committed line.
    assert!(wait_until(1000, || {
        store.snapshot().history[0].translations.get("english")
            == Some(&"english:hello world".to_string())
    }));

    handle.stop();
}

#[test]
fn test_history_is_bounded_oldest_first() {
    let engine = MockSpeechEngine::new();
    let clock = Arc::new(MockClock::new());
    let mut handle = start(MockAudioSource::new(), engine.clone(), clock.clone());
    let store = handle.store();

    assert!(wait_until(1000, || engine.session_active()));
    for text in ["one", "two", "three"] {
        assert!(engine.emit(RecognitionEvent::Final(text.to_string())));
        clock.advance(Duration::from_millis(300));
    }

    assert!(wait_until(1000, || {
        store.snapshot().history.iter().any(|l| l.original == "three")
    }));

    // max_history is 2: "one" was evicted, order is oldest first.
    let snapshot = store.snapshot();
    let originals: Vec<&str> = snapshot.history.iter().map(|l| l.original.as_str()).collect();
    assert_eq!(originals, vec!["two", "three"]);

    handle.stop();
}

#[test]
fn test_debounce_window_reopens_after_advance() {
    let engine = MockSpeechEngine::new();
    let clock = Arc::new(MockClock::new());
    let mut handle = start(MockAudioSource::new(), engine.clone(), clock.clone());
    let store = handle.store();

    assert!(wait_until(1000, || engine.session_active()));

    assert!(engine.emit(RecognitionEvent::Partial("first".to_string())));
    assert!(wait_until(1000, || store.snapshot().partial.original == "first"));

    clock.advance(Duration::from_millis(250));
    assert!(engine.emit(RecognitionEvent::Partial("first words".to_string())));
    assert!(wait_until(1000, || {
        store.snapshot().partial.original == "first words"
    }));

    handle.stop();
}

#[test]
fn test_stop_quiesces_the_pipeline() {
    let engine = MockSpeechEngine::new();
    let clock = Arc::new(MockClock::new());
    let mut handle = start(MockAudioSource::new(), engine.clone(), clock);
    let store = handle.store();

    assert!(wait_until(1000, || engine.session_active()));
    assert!(engine.emit(RecognitionEvent::Final("before stop".to_string())));
    assert!(wait_until(1000, || store.snapshot().history.len() == 1));

    handle.stop();
    assert!(!handle.is_running());
    assert!(!engine.session_active());

    // The store stays readable but no longer changes.
    let version = store.version();
    assert!(!engine.emit(RecognitionEvent::Final("after stop".to_string())));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(store.version(), version);
    assert_eq!(store.snapshot().history[0].original, "before stop");
}
