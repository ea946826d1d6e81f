use chrono::NaiveDate;
use thiserror::Error;

use crate::engine::gamification::{Badge, motivational_message};
use crate::model::{LessonMode, MemorizationProgress, UserProgress, VerseKey};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("cannot complete an empty lesson window")]
    EmptyWindow,
    #[error("this mode was already completed today")]
    AlreadyCompletedToday,
    #[error("not every verse in the window has been memorized")]
    GateNotSatisfied,
}

//
// ─── COMPLETION GATE ───────────────────────────────────────────────────────────
//

/// Whether the user may complete today's lesson in the given mode.
///
/// Reading has no gate. Memorizing requires every verse in the window to
/// have reached the repetition target.
#[must_use]
pub fn can_complete(
    mode: LessonMode,
    window: &[VerseKey],
    memorization: &MemorizationProgress,
) -> bool {
    match mode {
        LessonMode::Read => true,
        LessonMode::Memorize => memorization.all_memorized(window.iter()),
    }
}

/// Whether this mode has already been completed on the given calendar day.
///
/// Mode-scoped: a read completion never marks memorize complete, and vice
/// versa.
#[must_use]
pub fn already_completed_today(
    mode: LessonMode,
    progress: &UserProgress,
    today: NaiveDate,
) -> bool {
    progress.completed_on(mode, today)
}

//
// ─── COMPLETION UPDATE ─────────────────────────────────────────────────────────
//

/// Everything a completion produces, returned as one value.
///
/// `updated` is the full record after the event; callers persist it with a
/// single atomic write. Streak, cursor, counters, and the completion date
/// moving separately is a lost-update bug, so they never leave this module
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub updated: UserProgress,
    pub streak_incremented: bool,
    pub message: &'static str,
    pub badge: Option<Badge>,
}

/// Builds the combined update for completing today's lesson.
///
/// The streak increments only if no mode was completed today yet; a second
/// mode on the same day still updates its own date, counter, and cursor.
/// The cursor advances past the last shown verse, rolling into the next
/// surah when the content source reported the following verse absent
/// (`next_verse_exists = false`). Past surah 114 the cursor saturates
/// in place.
///
/// # Errors
///
/// - `CompletionError::EmptyWindow` if the window has no verses
/// - `CompletionError::AlreadyCompletedToday` if this mode is done for today
/// - `CompletionError::GateNotSatisfied` if the memorize gate fails
pub fn build_completion(
    progress: &UserProgress,
    mode: LessonMode,
    window: &[VerseKey],
    memorization: &MemorizationProgress,
    next_verse_exists: bool,
    today: NaiveDate,
) -> Result<CompletionOutcome, CompletionError> {
    let Some(last_shown) = window.last() else {
        return Err(CompletionError::EmptyWindow);
    };

    if already_completed_today(mode, progress, today) {
        return Err(CompletionError::AlreadyCompletedToday);
    }

    if !can_complete(mode, window, memorization) {
        return Err(CompletionError::GateNotSatisfied);
    }

    let next_cursor = if next_verse_exists {
        last_shown.next_in_surah()
    } else {
        last_shown
            .start_of_next_surah()
            .unwrap_or_else(|| last_shown.next_in_surah())
    };

    let mut updated = progress.clone();
    let streak_incremented = !updated.any_completed_on(today);
    if streak_incremented {
        updated.increment_streak();
    }
    updated.record_mode_completion(mode, today, window.len() as u64, next_cursor);

    let streak = updated.current_streak();
    Ok(CompletionOutcome {
        updated,
        streak_incremented,
        message: motivational_message(streak),
        badge: Badge::for_streak(streak),
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_today;

    fn key(surah: u16, ayah: u16) -> VerseKey {
        VerseKey::new(surah, ayah).unwrap()
    }

    fn window(surah: u16, from: u16, len: u16) -> Vec<VerseKey> {
        (0..len).map(|i| key(surah, from + i)).collect()
    }

    fn memorized(window: &[VerseKey]) -> MemorizationProgress {
        let mut progress = MemorizationProgress::new();
        for k in window {
            for _ in 0..3 {
                progress.record_repetition(*k);
            }
        }
        progress
    }

    #[test]
    fn read_mode_has_no_gate() {
        let w = window(1, 1, 3);
        assert!(can_complete(LessonMode::Read, &w, &MemorizationProgress::new()));
    }

    #[test]
    fn memorize_gate_requires_every_verse() {
        let w = window(1, 1, 3);
        let mut reps = MemorizationProgress::new();
        for k in &w[..2] {
            for _ in 0..3 {
                reps.record_repetition(*k);
            }
        }
        reps.record_repetition(w[2]);
        reps.record_repetition(w[2]);

        // [3, 3, 2] fails the gate, [3, 3, 3] passes.
        assert!(!can_complete(LessonMode::Memorize, &w, &reps));
        reps.record_repetition(w[2]);
        assert!(can_complete(LessonMode::Memorize, &w, &reps));
    }

    #[test]
    fn first_completion_starts_the_streak() {
        let today = fixed_today();
        let progress = UserProgress::new_user(3).unwrap();
        let w = window(1, 1, 3);

        let outcome = build_completion(
            &progress,
            LessonMode::Read,
            &w,
            &MemorizationProgress::new(),
            true,
            today,
        )
        .unwrap();

        assert!(outcome.streak_incremented);
        assert_eq!(outcome.updated.current_streak(), 1);
        assert_eq!(outcome.updated.longest_streak(), 1);
        assert_eq!(outcome.updated.total_verses_completed(), 3);
        assert_eq!(outcome.updated.cursor(LessonMode::Read), key(1, 4));
        assert_eq!(outcome.badge, Some(Badge::FirstStep));
    }

    #[test]
    fn second_mode_on_the_same_day_does_not_double_count() {
        let today = fixed_today();
        let progress = UserProgress::new_user(3).unwrap();
        let w = window(1, 1, 3);

        let after_read = build_completion(
            &progress,
            LessonMode::Read,
            &w,
            &MemorizationProgress::new(),
            true,
            today,
        )
        .unwrap()
        .updated;

        let outcome = build_completion(
            &after_read,
            LessonMode::Memorize,
            &w,
            &memorized(&w),
            true,
            today,
        )
        .unwrap();

        assert!(!outcome.streak_incremented);
        assert_eq!(outcome.updated.current_streak(), 1);
        // The memorize side still records its own date, counter, and cursor.
        assert!(outcome.updated.completed_on(LessonMode::Memorize, today));
        assert_eq!(outcome.updated.total_verses_memorized(), 3);
        assert_eq!(outcome.updated.cursor(LessonMode::Memorize), key(1, 4));
    }

    #[test]
    fn repeating_a_mode_the_same_day_is_rejected() {
        let today = fixed_today();
        let progress = UserProgress::new_user(3).unwrap();
        let w = window(1, 1, 3);

        let once = build_completion(
            &progress,
            LessonMode::Read,
            &w,
            &MemorizationProgress::new(),
            true,
            today,
        )
        .unwrap()
        .updated;

        let err = build_completion(
            &once,
            LessonMode::Read,
            &w,
            &MemorizationProgress::new(),
            true,
            today,
        )
        .unwrap_err();
        assert!(matches!(err, CompletionError::AlreadyCompletedToday));
    }

    #[test]
    fn unmet_gate_is_rejected() {
        let today = fixed_today();
        let progress = UserProgress::new_user(3).unwrap();
        let w = window(1, 1, 3);

        let err = build_completion(
            &progress,
            LessonMode::Memorize,
            &w,
            &MemorizationProgress::new(),
            true,
            today,
        )
        .unwrap_err();
        assert!(matches!(err, CompletionError::GateNotSatisfied));
    }

    #[test]
    fn cursor_rolls_into_the_next_surah() {
        let today = fixed_today();
        // Cursor at the last verse of Al-Baqarah, window of one.
        let progress = UserProgress::from_persisted(
            key(2, 286),
            VerseKey::first(),
            1,
            0,
            0,
            None,
            None,
            0,
            0,
        )
        .unwrap();
        let w = vec![key(2, 286)];

        // Content source reported 2:287 absent.
        let outcome = build_completion(
            &progress,
            LessonMode::Read,
            &w,
            &MemorizationProgress::new(),
            false,
            today,
        )
        .unwrap();
        assert_eq!(outcome.updated.cursor(LessonMode::Read), key(3, 1));
    }

    #[test]
    fn cursor_saturates_at_the_end_of_the_quran() {
        let today = fixed_today();
        let progress = UserProgress::from_persisted(
            key(114, 6),
            VerseKey::first(),
            1,
            0,
            0,
            None,
            None,
            0,
            0,
        )
        .unwrap();
        let w = vec![key(114, 6)];

        let outcome = build_completion(
            &progress,
            LessonMode::Read,
            &w,
            &MemorizationProgress::new(),
            false,
            today,
        )
        .unwrap();
        assert_eq!(outcome.updated.cursor(LessonMode::Read), key(114, 7));
    }

    #[test]
    fn empty_window_is_rejected() {
        let err = build_completion(
            &UserProgress::new_user(3).unwrap(),
            LessonMode::Read,
            &[],
            &MemorizationProgress::new(),
            true,
            fixed_today(),
        )
        .unwrap_err();
        assert!(matches!(err, CompletionError::EmptyWindow));
    }

    #[test]
    fn longest_streak_never_decreases() {
        let mut progress = UserProgress::from_persisted(
            key(5, 10),
            VerseKey::first(),
            1,
            2,
            9,
            Some(fixed_today().pred_opt().unwrap()),
            None,
            20,
            0,
        )
        .unwrap();

        let mut longest = progress.longest_streak();
        let mut day = fixed_today();
        for _ in 0..12 {
            let w = vec![progress.cursor(LessonMode::Read)];
            let outcome = build_completion(
                &progress,
                LessonMode::Read,
                &w,
                &MemorizationProgress::new(),
                true,
                day,
            )
            .unwrap();
            progress = outcome.updated;
            assert!(progress.longest_streak() >= longest);
            longest = progress.longest_streak();
            day = day.succ_opt().unwrap();
        }

        // 2 + 12 daily completions pushes past the stored longest of 9.
        assert_eq!(progress.current_streak(), 14);
        assert_eq!(progress.longest_streak(), 14);
    }
}
