use std::collections::HashMap;

use crate::model::verse::VerseKey;

/// Repetitions required before a verse counts as memorized.
pub const REQUIRED_REPETITIONS: u8 = 3;

/// Per-session repetition tracking for memorize mode.
///
/// Lives only as long as the open lesson view; nothing here is persisted.
/// Counts are clamped to [`REQUIRED_REPETITIONS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorizationProgress {
    counts: HashMap<VerseKey, u8>,
}

impl MemorizationProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one recitation of the verse and returns the new count.
    pub fn record_repetition(&mut self, key: VerseKey) -> u8 {
        let count = self.counts.entry(key).or_insert(0);
        *count = count.saturating_add(1).min(REQUIRED_REPETITIONS);
        *count
    }

    #[must_use]
    pub fn repetitions(&self, key: VerseKey) -> u8 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_memorized(&self, key: VerseKey) -> bool {
        self.repetitions(key) >= REQUIRED_REPETITIONS
    }

    /// True when every verse in the window has reached the required count.
    #[must_use]
    pub fn all_memorized<'a>(&self, keys: impl IntoIterator<Item = &'a VerseKey>) -> bool {
        keys.into_iter().all(|key| self.is_memorized(*key))
    }

    /// Discards all counts, e.g. when a new lesson view opens.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
