//! Caption data types.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Unique identifier of a finalized caption line. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub(crate) u64);

impl LineId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One finalized caption line.
///
/// Created only by `CaptionStore::commit_final`, mutated only by
/// translation-result application, destroyed only by history eviction.
#[derive(Debug, Clone)]
pub struct CaptionLine {
    pub id: LineId,
    pub created_at: Instant,
    pub original: String,
    /// Translated text per target language, filled in as results arrive.
    pub translations: HashMap<String, String>,
}

impl CaptionLine {
    pub(crate) fn new(id: LineId, original: String) -> Self {
        Self {
            id,
            created_at: Instant::now(),
            original,
            translations: HashMap::new(),
        }
    }
}

/// The in-progress caption line. Singleton, overwritten in place.
#[derive(Debug, Clone, Default)]
pub struct PartialCaption {
    pub original: String,
    /// Per-language partial translation text.
    pub translations: HashMap<String, String>,
}

impl PartialCaption {
    pub fn is_empty(&self) -> bool {
        self.original.is_empty() && self.translations.is_empty()
    }
}

/// Read-only view of the caption state for the presentation layer.
///
/// `version` increases on every visible mutation; consumers poll it to
/// detect changes cheaply before taking a full snapshot.
#[derive(Debug, Clone)]
pub struct CaptionSnapshot {
    /// Finalized lines in commit order, oldest first.
    pub history: Vec<CaptionLine>,
    pub partial: PartialCaption,
    /// Latest human-readable status message, if any.
    pub status: Option<String>,
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_id_display() {
        assert_eq!(LineId(7).to_string(), "L7");
    }

    #[test]
    fn test_line_id_ordering_follows_allocation() {
        assert!(LineId(1) < LineId(2));
    }

    #[test]
    fn test_partial_caption_is_empty() {
        let mut partial = PartialCaption::default();
        assert!(partial.is_empty());
        partial.original = "hel".to_string();
        assert!(!partial.is_empty());
    }
}
