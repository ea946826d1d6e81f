mod app_settings;
mod ids;
mod memorization;
mod progress;
mod social;
mod verse;

pub use app_settings::{AppSettings, AppSettingsDraft, AppSettingsError};
pub use ids::{CommentId, ParseIdError, ThreadId, UserId};
pub use memorization::{MemorizationProgress, REQUIRED_REPETITIONS};
pub use progress::{
    DEFAULT_DAILY_AYATS, LessonMode, MAX_DAILY_AYATS, MIN_DAILY_AYATS, ProgressError, UserProgress,
    validate_daily_ayats,
};
pub use social::{
    Comment, CommentError, Friendship, FriendshipError, FriendshipStatus, LeaderboardEntry,
    SharedAyah, Thread, ThreadDraft, ThreadError, ThreadKind,
};
pub use verse::{SURAH_COUNT, Verse, VerseKey, VerseKeyError};
