#![forbid(unsafe_code)]

pub mod app_services;
pub mod content;
pub mod error;
pub mod lesson_service;
pub mod progress_service;
pub mod social_service;

pub use quest_core::Clock;

pub use app_services::AppServices;
pub use content::{DEFAULT_QURAN_API_BASE_URL, QuranApiClient, QuranApiConfig, StaticVerseSource, VerseSource};
pub use error::{
    AppServicesError, ContentError, LessonError, ProgressServiceError, SocialServiceError,
};
pub use lesson_service::{LessonService, LessonWindow};
pub use progress_service::{CompletionReport, ProgressService, ProgressSnapshot, StreakNotice};
pub use social_service::SocialService;
