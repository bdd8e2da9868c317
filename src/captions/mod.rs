//! Caption state: bounded finalized history plus the current partial line.

pub mod store;
pub mod types;

pub use store::CaptionStore;
pub use types::{CaptionLine, CaptionSnapshot, LineId, PartialCaption};
