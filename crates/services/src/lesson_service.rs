use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use quest_core::model::{Verse, VerseKey};

use crate::content::VerseSource;
use crate::error::LessonError;

//
// ─── LESSON WINDOW ─────────────────────────────────────────────────────────────
//

/// The ordered verses presented for "today", plus where the cursor moves
/// once they are completed.
///
/// Derived and recomputed on every open of the lesson view; only the cursor
/// in the progress record is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonWindow {
    verses: Vec<Verse>,
    next_cursor: VerseKey,
}

impl LessonWindow {
    #[must_use]
    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    /// Positions of the verses in reading order.
    #[must_use]
    pub fn keys(&self) -> Vec<VerseKey> {
        self.verses.iter().map(|v| v.key).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.verses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// The last verse shown, if any.
    #[must_use]
    pub fn last_shown(&self) -> Option<VerseKey> {
        self.verses.last().map(|v| v.key)
    }

    /// Where the cursor lands after completing this window.
    #[must_use]
    pub fn next_cursor(&self) -> VerseKey {
        self.next_cursor
    }

    /// True if completion stays within the last shown surah, i.e. the verse
    /// after the last shown one exists.
    #[must_use]
    pub fn advances_within_surah(&self) -> bool {
        match self.last_shown() {
            Some(last) => self.next_cursor.surah() == last.surah(),
            None => true,
        }
    }
}

//
// ─── RESOLVER ──────────────────────────────────────────────────────────────────
//

/// Resolves a cursor into today's lesson window.
pub struct LessonService {
    source: Arc<dyn VerseSource>,
}

impl LessonService {
    #[must_use]
    pub fn new(source: Arc<dyn VerseSource>) -> Self {
        Self { source }
    }

    /// Produce `count` verses starting at `cursor`, in reading order.
    ///
    /// The `count` lookups are dispatched concurrently; results are
    /// reassembled strictly in reading order regardless of arrival order. A
    /// slot whose verse is absent rolls into the next surah and retries
    /// once. A slot whose lookup fails transiently degrades to the fixed
    /// placeholder text instead of aborting the lesson. Fewer than `count`
    /// verses come back only when surah 114 is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidCount` if `count` is zero.
    pub async fn resolve_window(
        &self,
        cursor: VerseKey,
        count: u16,
    ) -> Result<LessonWindow, LessonError> {
        if count == 0 {
            return Err(LessonError::InvalidCount);
        }
        let n = usize::from(count);

        // Optimistic wave: assume the whole window sits in the cursor's
        // surah and fetch every slot at once.
        let mut optimistic = Vec::with_capacity(n);
        let mut key = cursor;
        for _ in 0..n {
            optimistic.push(key);
            key = key.next_in_surah();
        }
        let wave = join_all(optimistic.iter().map(|k| self.source.fetch_verse(*k))).await;

        // Repair pass, sequential and in reading order: slots invalidated by
        // an earlier rollover are refetched from the corrected position.
        let mut verses: Vec<Verse> = Vec::with_capacity(n);
        let mut pos = Some(cursor);
        for (slot, wave_result) in wave.into_iter().enumerate() {
            let Some(current) = pos else {
                break;
            };

            let result = if current == optimistic[slot] {
                wave_result
            } else {
                self.source.fetch_verse(current).await
            };

            match result {
                Ok(Some(verse)) => {
                    verses.push(verse);
                    pos = Some(current.next_in_surah());
                }
                Ok(None) => match current.start_of_next_surah() {
                    Some(rolled) => match self.source.fetch_verse(rolled).await {
                        Ok(Some(verse)) => {
                            verses.push(verse);
                            pos = Some(rolled.next_in_surah());
                        }
                        Ok(None) => {
                            debug!(%rolled, "content source exhausted");
                            pos = None;
                        }
                        Err(err) => {
                            warn!(%rolled, error = %err, "verse lookup failed, using placeholder");
                            verses.push(Verse::placeholder_at(rolled));
                            pos = Some(rolled.next_in_surah());
                        }
                    },
                    None => {
                        debug!(%current, "reached the end of the final surah");
                        pos = None;
                    }
                },
                Err(err) => {
                    warn!(%current, error = %err, "verse lookup failed, using placeholder");
                    verses.push(Verse::placeholder_at(current));
                    pos = Some(current.next_in_surah());
                }
            }
        }

        let next_cursor = self.probe_next_cursor(&verses, pos, cursor).await;
        Ok(LessonWindow {
            verses,
            next_cursor,
        })
    }

    /// Decide where the cursor should land after this window completes.
    ///
    /// One lookup past the last shown verse: absent means the next surah
    /// starts, a transient error keeps the optimistic in-surah position (the
    /// next resolve repairs an overshoot via the rollover rule).
    async fn probe_next_cursor(
        &self,
        verses: &[Verse],
        pos: Option<VerseKey>,
        cursor: VerseKey,
    ) -> VerseKey {
        let Some(last) = verses.last() else {
            return cursor;
        };
        let Some(expected) = pos else {
            return last.key.next_in_surah();
        };

        match self.source.fetch_verse(expected).await {
            Ok(Some(_)) => expected,
            Ok(None) => last.key.start_of_next_surah().unwrap_or(expected),
            Err(err) => {
                warn!(%expected, error = %err, "next-cursor probe failed, keeping in-surah position");
                expected
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticVerseSource;

    fn key(surah: u16, ayah: u16) -> VerseKey {
        VerseKey::new(surah, ayah).unwrap()
    }

    fn service(source: StaticVerseSource) -> LessonService {
        LessonService::new(Arc::new(source))
    }

    #[tokio::test]
    async fn gapless_source_yields_exactly_n_verses() {
        let svc = service(StaticVerseSource::new().with_surah(2, 286));

        for n in [1u16, 3, 10] {
            let window = svc.resolve_window(key(2, 10), n).await.unwrap();
            assert_eq!(window.len(), usize::from(n));
            assert_eq!(window.keys()[0], key(2, 10));
        }
    }

    #[tokio::test]
    async fn verses_come_back_in_reading_order() {
        let svc = service(StaticVerseSource::new().with_surah(3, 200));
        let window = svc.resolve_window(key(3, 5), 6).await.unwrap();

        let keys = window.keys();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[tokio::test]
    async fn window_rolls_into_the_next_surah() {
        // Surah 1 ends at ayah 7; the window crosses into surah 2.
        let svc = service(
            StaticVerseSource::new()
                .with_surah(1, 7)
                .with_surah(2, 286),
        );

        let window = svc.resolve_window(key(1, 6), 3).await.unwrap();
        assert_eq!(window.keys(), vec![key(1, 6), key(1, 7), key(2, 1)]);
        assert_eq!(window.next_cursor(), key(2, 2));
    }

    #[tokio::test]
    async fn transient_failure_degrades_to_placeholder() {
        let svc = service(
            StaticVerseSource::new()
                .with_surah(1, 7)
                .fail_at(key(1, 2)),
        );

        let window = svc.resolve_window(key(1, 1), 3).await.unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window.keys(), vec![key(1, 1), key(1, 2), key(1, 3)]);
        assert!(window.verses()[1].is_placeholder());
        assert!(!window.verses()[0].is_placeholder());
    }

    #[tokio::test]
    async fn exhausting_the_final_surah_returns_fewer_verses() {
        let svc = service(StaticVerseSource::new().with_surah(114, 6));

        let window = svc.resolve_window(key(114, 5), 4).await.unwrap();
        assert_eq!(window.keys(), vec![key(114, 5), key(114, 6)]);
        // Saturates in place; there is nothing after surah 114.
        assert_eq!(window.next_cursor(), key(114, 7));
    }

    #[tokio::test]
    async fn next_cursor_rolls_when_the_following_verse_is_absent() {
        let svc = service(
            StaticVerseSource::new()
                .with_surah(2, 286)
                .with_surah(3, 200),
        );

        // Window ends exactly on the last verse of Al-Baqarah.
        let window = svc.resolve_window(key(2, 286), 1).await.unwrap();
        assert_eq!(window.keys(), vec![key(2, 286)]);
        assert_eq!(window.next_cursor(), key(3, 1));
        assert!(!window.advances_within_surah());
    }

    #[tokio::test]
    async fn next_cursor_stays_in_surah_when_more_verses_remain() {
        let svc = service(StaticVerseSource::new().with_surah(2, 286));

        let window = svc.resolve_window(key(2, 1), 3).await.unwrap();
        assert_eq!(window.next_cursor(), key(2, 4));
        assert!(window.advances_within_surah());
    }

    #[tokio::test]
    async fn empty_source_keeps_the_cursor_authoritative() {
        let svc = service(StaticVerseSource::new());

        let window = svc.resolve_window(key(114, 7), 3).await.unwrap();
        assert!(window.is_empty());
        assert_eq!(window.next_cursor(), key(114, 7));
    }

    #[tokio::test]
    async fn zero_count_is_rejected() {
        let svc = service(StaticVerseSource::new().with_surah(1, 7));
        assert!(matches!(
            svc.resolve_window(key(1, 1), 0).await,
            Err(LessonError::InvalidCount)
        ));
    }
}
