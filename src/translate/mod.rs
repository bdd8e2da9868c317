//! Translation seam and per-language fan-out.

pub mod dispatcher;
pub mod engine;

pub use dispatcher::{TranslationDispatcher, TranslationJob};
pub use engine::{MockTranslator, Translator};
