use chrono::NaiveDate;

use crate::model::UserProgress;

/// Streak length at which a single missed day stops breaking the chain.
pub const GRACE_MILESTONE_DAYS: u32 = 14;

//
// ─── EVALUATION ────────────────────────────────────────────────────────────────
//

/// Outcome of the lazy streak check performed whenever progress is loaded.
///
/// `Reset` carries the streak that was lost so the caller can show the
/// one-time streak-lost notice, which is distinct from the completion flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakEvaluation {
    /// Today is already accounted for, or there is nothing to lose.
    Unchanged,
    /// Exactly one day was missed but the 14-day milestone forgives it.
    GracePreserved,
    /// The chain broke; the streak drops to zero.
    Reset { previous: u32 },
}

impl StreakEvaluation {
    #[must_use]
    pub fn is_reset(&self) -> bool {
        matches!(self, StreakEvaluation::Reset { .. })
    }
}

/// Evaluates the streak transition rule against the given calendar day.
///
/// The rule runs lazily on load, never on a timer:
/// - no completion yet, or the last one was today ⇒ unchanged
/// - one day missed with a streak of at least 14 ⇒ preserved (grace)
/// - one day missed below the milestone, or more than one day ⇒ reset
///
/// Evaluating twice with the same `today` yields the same result: once a
/// reset has been applied the streak is zero and there is nothing left to
/// reset.
#[must_use]
pub fn evaluate_streak(progress: &UserProgress, today: NaiveDate) -> StreakEvaluation {
    let Some(last) = progress.latest_completion() else {
        return StreakEvaluation::Unchanged;
    };

    let days_since = (today - last).num_days();
    if days_since <= 0 {
        return StreakEvaluation::Unchanged;
    }

    if days_since == 1 && progress.current_streak() >= GRACE_MILESTONE_DAYS {
        return StreakEvaluation::GracePreserved;
    }

    match progress.current_streak() {
        0 => StreakEvaluation::Unchanged,
        previous => StreakEvaluation::Reset { previous },
    }
}

/// Applies the evaluation to the record. Only `Reset` mutates anything;
/// `longest_streak` is never touched.
pub fn apply_streak_evaluation(progress: &mut UserProgress, evaluation: StreakEvaluation) {
    if evaluation.is_reset() {
        progress.zero_streak();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonMode, VerseKey};
    use crate::time::fixed_today;
    use chrono::Duration;

    fn progress_with_streak(streak: u32, completed_days_ago: i64) -> UserProgress {
        let today = fixed_today();
        UserProgress::from_persisted(
            VerseKey::new(2, 100).unwrap(),
            VerseKey::first(),
            3,
            streak,
            streak.max(20),
            Some(today - Duration::days(completed_days_ago)),
            None,
            50,
            0,
        )
        .unwrap()
    }

    #[test]
    fn same_day_is_unchanged() {
        let progress = progress_with_streak(5, 0);
        assert_eq!(
            evaluate_streak(&progress, fixed_today()),
            StreakEvaluation::Unchanged
        );
    }

    #[test]
    fn no_completion_yet_is_unchanged() {
        let progress = UserProgress::new_user(3).unwrap();
        assert_eq!(
            evaluate_streak(&progress, fixed_today()),
            StreakEvaluation::Unchanged
        );
    }

    #[test]
    fn one_missed_day_at_the_milestone_is_forgiven() {
        let progress = progress_with_streak(14, 1);
        assert_eq!(
            evaluate_streak(&progress, fixed_today()),
            StreakEvaluation::GracePreserved
        );
        // Streak stays at 14 after applying.
        let mut applied = progress.clone();
        apply_streak_evaluation(&mut applied, evaluate_streak(&progress, fixed_today()));
        assert_eq!(applied.current_streak(), 14);
    }

    #[test]
    fn one_missed_day_below_the_milestone_resets() {
        let progress = progress_with_streak(13, 1);
        assert_eq!(
            evaluate_streak(&progress, fixed_today()),
            StreakEvaluation::Reset { previous: 13 }
        );
    }

    #[test]
    fn two_missed_days_reset_any_streak() {
        for streak in [1, 14, 365] {
            let progress = progress_with_streak(streak, 2);
            assert_eq!(
                evaluate_streak(&progress, fixed_today()),
                StreakEvaluation::Reset { previous: streak }
            );
        }
    }

    #[test]
    fn evaluation_is_idempotent_within_a_day() {
        let today = fixed_today();
        let mut progress = progress_with_streak(5, 3);

        let first = evaluate_streak(&progress, today);
        apply_streak_evaluation(&mut progress, first);
        assert_eq!(progress.current_streak(), 0);

        // Second pass over the already-reset record changes nothing and
        // raises no further notice.
        let second = evaluate_streak(&progress, today);
        assert_eq!(second, StreakEvaluation::Unchanged);
        apply_streak_evaluation(&mut progress, second);
        assert_eq!(progress.current_streak(), 0);
    }

    #[test]
    fn reset_leaves_longest_streak_alone() {
        let mut progress = progress_with_streak(13, 2);
        let longest = progress.longest_streak();
        let evaluation = evaluate_streak(&progress, fixed_today());
        apply_streak_evaluation(&mut progress, evaluation);
        assert_eq!(progress.longest_streak(), longest);
    }

    #[test]
    fn either_mode_keeps_the_streak_alive() {
        let today = fixed_today();
        // Read completion is stale, memorize completion was yesterday with a
        // milestone streak: the shared streak survives on the grace rule.
        let progress = UserProgress::from_persisted(
            VerseKey::new(2, 100).unwrap(),
            VerseKey::new(1, 4).unwrap(),
            3,
            20,
            20,
            Some(today - Duration::days(6)),
            Some(today - Duration::days(1)),
            60,
            9,
        )
        .unwrap();
        assert_eq!(
            progress.last_completed_for(LessonMode::Memorize),
            Some(today - Duration::days(1))
        );
        assert_eq!(
            evaluate_streak(&progress, today),
            StreakEvaluation::GracePreserved
        );
    }
}
