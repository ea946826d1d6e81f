//! The progress engine: pure decision logic over a [`UserProgress`] record.
//!
//! Nothing in here reads a clock or touches I/O; `today` always arrives as a
//! parameter and updates come back as whole values for the caller to persist
//! atomically.
//!
//! [`UserProgress`]: crate::model::UserProgress

mod completion;
mod gamification;
mod streak;

pub use completion::{
    CompletionError, CompletionOutcome, already_completed_today, build_completion, can_complete,
};
pub use gamification::{Badge, motivational_message};
pub use streak::{
    GRACE_MILESTONE_DAYS, StreakEvaluation, apply_streak_evaluation, evaluate_streak,
};
