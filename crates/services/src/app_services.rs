use std::sync::Arc;

use quest_core::model::AppSettings;
use quest_core::time::Clock;
use quest_storage::repository::Storage;

use crate::content::{QuranApiClient, QuranApiConfig, VerseSource};
use crate::error::AppServicesError;
use crate::lesson_service::LessonService;
use crate::progress_service::ProgressService;
use crate::social_service::SocialService;

/// Assembles the app-facing services over one storage backend and one verse
/// source.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    lessons: Arc<LessonService>,
    social: Arc<SocialService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP verse API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: &AppSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source: Arc<dyn VerseSource> =
            Arc::new(QuranApiClient::new(QuranApiConfig::resolve(settings)));
        Ok(Self::assemble(storage, clock, source))
    }

    /// Build services over in-memory storage and the given verse source,
    /// mainly for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock, source: Arc<dyn VerseSource>) -> Self {
        Self::assemble(Storage::in_memory(), clock, source)
    }

    /// Build services over an existing storage backend.
    #[must_use]
    pub fn with_storage(storage: Storage, clock: Clock, source: Arc<dyn VerseSource>) -> Self {
        Self::assemble(storage, clock, source)
    }

    fn assemble(storage: Storage, clock: Clock, source: Arc<dyn VerseSource>) -> Self {
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&storage.progress)));
        let lessons = Arc::new(LessonService::new(source));
        let social = Arc::new(SocialService::new(
            clock,
            Arc::clone(&storage.social),
            Arc::clone(&storage.progress),
        ));

        Self {
            progress,
            lessons,
            social,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn social(&self) -> Arc<SocialService> {
        Arc::clone(&self.social)
    }
}
