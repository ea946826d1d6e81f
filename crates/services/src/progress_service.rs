use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use quest_core::engine::{
    Badge, CompletionOutcome, StreakEvaluation, apply_streak_evaluation, build_completion,
    evaluate_streak,
};
use quest_core::model::{
    DEFAULT_DAILY_AYATS, LessonMode, MemorizationProgress, UserId, UserProgress,
};
use quest_core::time::Clock;
use quest_storage::repository::ProgressRepository;

use crate::error::ProgressServiceError;
use crate::lesson_service::LessonWindow;

//
// ─── SNAPSHOTS ─────────────────────────────────────────────────────────────────
//

/// One-time user-visible notice raised by the lazy streak evaluation.
///
/// Distinct from the completion flow: it fires on load, at most once per
/// break, and never again once the reset has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakNotice {
    Lost { previous: u32 },
}

/// Result of loading a user's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub progress: UserProgress,
    pub streak_notice: Option<StreakNotice>,
    /// True when the record was just created with new-user defaults.
    pub created: bool,
}

/// Result of completing today's lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub mode: LessonMode,
    pub verses_completed: usize,
    pub streak: u32,
    pub longest_streak: u32,
    pub streak_incremented: bool,
    pub message: &'static str,
    pub badge: Option<Badge>,
    pub progress: UserProgress,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates the progress engine over the persisted record.
///
/// The engine itself stays pure; this service supplies the calendar day from
/// its clock and turns engine outputs into single atomic repository writes.
pub struct ProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, repo }
    }

    /// Current calendar day according to the service's clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Load a user's progress, applying the lazy streak evaluation.
    ///
    /// A confirmed-absent record is created with new-user defaults; a
    /// transient read failure is surfaced instead, never papered over with
    /// defaults. When the evaluation breaks the streak, the reset is
    /// persisted here and reported via `streak_notice` exactly once.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` for repository failures.
    pub async fn load(&self, user: &UserId) -> Result<ProgressSnapshot, ProgressServiceError> {
        let today = self.today();

        let Some(mut progress) = self.repo.read_progress(user).await? else {
            let fresh = UserProgress::new_user(DEFAULT_DAILY_AYATS)?;
            self.repo.create_progress(user, &fresh).await?;
            info!(%user, "created progress record for new user");
            return Ok(ProgressSnapshot {
                progress: fresh,
                streak_notice: None,
                created: true,
            });
        };

        let evaluation = evaluate_streak(&progress, today);
        let streak_notice = match evaluation {
            StreakEvaluation::Reset { previous } => {
                apply_streak_evaluation(&mut progress, evaluation);
                self.repo.save_streak_reset(user, &progress).await?;
                warn!(%user, previous, "streak broken");
                Some(StreakNotice::Lost { previous })
            }
            _ => None,
        };

        Ok(ProgressSnapshot {
            progress,
            streak_notice,
            created: false,
        })
    }

    /// Complete today's lesson in the given mode.
    ///
    /// Runs the completion gate, builds the combined update (streak, dates,
    /// counters, cursor) in the engine, and persists it as one atomic
    /// repository write. Nothing is mutated locally ahead of the store, so a
    /// failed write leaves no divergent state behind.
    ///
    /// # Errors
    ///
    /// - `ProgressServiceError::Storage` with `NotFound` if the record is
    ///   missing, or `Conflict` if another session completed this mode today
    /// - `ProgressServiceError::Completion` if the gate or day check fails
    pub async fn complete_lesson(
        &self,
        user: &UserId,
        mode: LessonMode,
        window: &LessonWindow,
        memorization: &MemorizationProgress,
    ) -> Result<CompletionReport, ProgressServiceError> {
        let today = self.today();

        let mut progress = self
            .repo
            .read_progress(user)
            .await?
            .ok_or(quest_storage::repository::StorageError::NotFound)?;

        // The evaluation normally ran on load; repeating it here is
        // idempotent and keeps a stale snapshot from inflating the streak.
        let streak_evaluation = evaluate_streak(&progress, today);
        apply_streak_evaluation(&mut progress, streak_evaluation);

        let keys = window.keys();
        let CompletionOutcome {
            updated,
            streak_incremented,
            message,
            badge,
        } = build_completion(
            &progress,
            mode,
            &keys,
            memorization,
            window.advances_within_surah(),
            today,
        )?;

        self.repo
            .apply_completion(user, mode, &updated, today)
            .await?;

        info!(
            %user,
            mode = mode.as_str(),
            verses = window.len(),
            streak = updated.current_streak(),
            "lesson completed"
        );

        Ok(CompletionReport {
            mode,
            verses_completed: window.len(),
            streak: updated.current_streak(),
            longest_streak: updated.longest_streak(),
            streak_incremented,
            message,
            badge,
            progress: updated,
        })
    }

    /// Change the user's lesson size.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` for an out-of-range size and
    /// `ProgressServiceError::Storage` for repository failures.
    pub async fn update_daily_ayats(
        &self,
        user: &UserId,
        daily_ayats: u16,
    ) -> Result<(), ProgressServiceError> {
        quest_core::model::validate_daily_ayats(daily_ayats)?;
        self.repo.update_daily_ayats(user, daily_ayats).await?;
        Ok(())
    }

    /// Reset the user's progress to new-user defaults.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` for repository failures.
    pub async fn reset(&self, user: &UserId) -> Result<(), ProgressServiceError> {
        self.repo.reset_progress(user).await?;
        info!(%user, "progress reset");
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
