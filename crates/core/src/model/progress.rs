use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::verse::VerseKey;

/// Smallest allowed daily lesson size.
pub const MIN_DAILY_AYATS: u16 = 1;
/// Largest allowed daily lesson size: the whole Quran in one sitting.
pub const MAX_DAILY_AYATS: u16 = 6236;
/// Lesson size a brand-new user starts with.
pub const DEFAULT_DAILY_AYATS: u16 = 3;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("daily ayats must be in {MIN_DAILY_AYATS}..={MAX_DAILY_AYATS}, got {provided}")]
    InvalidDailyAyats { provided: u16 },

    #[error("longest streak ({longest}) is below current streak ({current})")]
    StreakInvariant { current: u32, longest: u32 },

    #[error("unknown lesson mode: {0:?}")]
    UnknownMode(String),
}

//
// ─── LESSON MODE ───────────────────────────────────────────────────────────────
//

/// The two ways a user works through their daily verses.
///
/// Each mode owns an independent cursor, completion date, and verse counter.
/// Both modes feed a single shared streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonMode {
    Read,
    Memorize,
}

impl LessonMode {
    /// Stable textual form used for persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonMode::Read => "read",
            LessonMode::Memorize => "memorize",
        }
    }

    /// Parses the persisted textual form.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownMode` for anything other than
    /// `"read"` or `"memorize"`.
    pub fn parse(value: &str) -> Result<Self, ProgressError> {
        match value {
            "read" => Ok(LessonMode::Read),
            "memorize" => Ok(LessonMode::Memorize),
            other => Err(ProgressError::UnknownMode(other.to_string())),
        }
    }
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// The one persisted record per user that the progress engine operates on.
///
/// The cursors mark the next unread/unmemorized verse per mode. Completion
/// dates are calendar days, never instants. `longest_streak >= current_streak`
/// holds after every update, and the verse counters only grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    read_cursor: VerseKey,
    memorize_cursor: VerseKey,
    daily_ayats: u16,
    current_streak: u32,
    longest_streak: u32,
    last_completed: Option<NaiveDate>,
    memorize_last_completed: Option<NaiveDate>,
    total_verses_completed: u64,
    total_verses_memorized: u64,
}

/// Checks a lesson size against the allowed range.
///
/// # Errors
///
/// Returns `ProgressError::InvalidDailyAyats` if out of range.
pub fn validate_daily_ayats(daily_ayats: u16) -> Result<(), ProgressError> {
    if !(MIN_DAILY_AYATS..=MAX_DAILY_AYATS).contains(&daily_ayats) {
        return Err(ProgressError::InvalidDailyAyats {
            provided: daily_ayats,
        });
    }
    Ok(())
}

impl UserProgress {
    /// Fresh record for a user who just signed up: both cursors at 1:1,
    /// zero counters, no completion dates.
    ///
    /// These defaults apply only when the store has confirmed the record is
    /// absent, never as a fallback for a failed read.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidDailyAyats` if the lesson size is out
    /// of range.
    pub fn new_user(daily_ayats: u16) -> Result<Self, ProgressError> {
        validate_daily_ayats(daily_ayats)?;
        Ok(Self {
            read_cursor: VerseKey::first(),
            memorize_cursor: VerseKey::first(),
            daily_ayats,
            current_streak: 0,
            longest_streak: 0,
            last_completed: None,
            memorize_last_completed: None,
            total_verses_completed: 0,
            total_verses_memorized: 0,
        })
    }

    /// Rehydrates a record from persisted storage, enforcing invariants.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidDailyAyats` for an out-of-range lesson
    /// size, or `ProgressError::StreakInvariant` when the longest streak is
    /// below the current one.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        read_cursor: VerseKey,
        memorize_cursor: VerseKey,
        daily_ayats: u16,
        current_streak: u32,
        longest_streak: u32,
        last_completed: Option<NaiveDate>,
        memorize_last_completed: Option<NaiveDate>,
        total_verses_completed: u64,
        total_verses_memorized: u64,
    ) -> Result<Self, ProgressError> {
        validate_daily_ayats(daily_ayats)?;
        if longest_streak < current_streak {
            return Err(ProgressError::StreakInvariant {
                current: current_streak,
                longest: longest_streak,
            });
        }

        Ok(Self {
            read_cursor,
            memorize_cursor,
            daily_ayats,
            current_streak,
            longest_streak,
            last_completed,
            memorize_last_completed,
            total_verses_completed,
            total_verses_memorized,
        })
    }

    #[must_use]
    pub fn cursor(&self, mode: LessonMode) -> VerseKey {
        match mode {
            LessonMode::Read => self.read_cursor,
            LessonMode::Memorize => self.memorize_cursor,
        }
    }

    #[must_use]
    pub fn daily_ayats(&self) -> u16 {
        self.daily_ayats
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    #[must_use]
    pub fn last_completed_for(&self, mode: LessonMode) -> Option<NaiveDate> {
        match mode {
            LessonMode::Read => self.last_completed,
            LessonMode::Memorize => self.memorize_last_completed,
        }
    }

    #[must_use]
    pub fn total_verses_completed(&self) -> u64 {
        self.total_verses_completed
    }

    #[must_use]
    pub fn total_verses_memorized(&self) -> u64 {
        self.total_verses_memorized
    }

    /// True if this mode was completed on the given calendar day.
    #[must_use]
    pub fn completed_on(&self, mode: LessonMode, day: NaiveDate) -> bool {
        self.last_completed_for(mode) == Some(day)
    }

    /// True if either mode was completed on the given calendar day.
    ///
    /// The streak increments at most once per day regardless of mode, so
    /// this is the question the completion update asks.
    #[must_use]
    pub fn any_completed_on(&self, day: NaiveDate) -> bool {
        self.completed_on(LessonMode::Read, day) || self.completed_on(LessonMode::Memorize, day)
    }

    /// The most recent completion date across both modes, if any.
    #[must_use]
    pub fn latest_completion(&self) -> Option<NaiveDate> {
        match (self.last_completed, self.memorize_last_completed) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Changes the lesson size.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidDailyAyats` if out of range.
    pub fn set_daily_ayats(&mut self, daily_ayats: u16) -> Result<(), ProgressError> {
        validate_daily_ayats(daily_ayats)?;
        self.daily_ayats = daily_ayats;
        Ok(())
    }

    // Mutators below are crate-private: only the engine builds updates, and
    // it returns them as one value so callers persist them atomically.

    pub(crate) fn zero_streak(&mut self) {
        self.current_streak = 0;
    }

    pub(crate) fn increment_streak(&mut self) {
        self.current_streak += 1;
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }

    pub(crate) fn record_mode_completion(
        &mut self,
        mode: LessonMode,
        day: NaiveDate,
        verses: u64,
        next_cursor: VerseKey,
    ) {
        match mode {
            LessonMode::Read => {
                self.last_completed = Some(day);
                self.total_verses_completed += verses;
                self.read_cursor = next_cursor;
            }
            LessonMode::Memorize => {
                self.memorize_last_completed = Some(day);
                self.total_verses_memorized += verses;
                self.memorize_cursor = next_cursor;
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
