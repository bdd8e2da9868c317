//! Pipeline wiring and lifecycle.
//!
//! Capture, conversion, recognition and translation each run on their own
//! threads, connected by crossbeam channels; the caption store is the single
//! serialization point for shared state.

pub mod orchestrator;

pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle};
