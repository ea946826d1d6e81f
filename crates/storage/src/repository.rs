use async_trait::async_trait;
use chrono::NaiveDate;
use quest_core::model::{
    Comment, Friendship, LessonMode, Thread, ThreadId, UserId, UserProgress,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the per-user progress record.
///
/// `read_progress` distinguishes a confirmed-absent record (`Ok(None)`) from
/// a failed read (`Err`); callers must never substitute new-user defaults for
/// the latter.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch a user's progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for transient failures; a missing record
    /// is `Ok(None)`.
    async fn read_progress(&self, user: &UserId) -> Result<Option<UserProgress>, StorageError>;

    /// Create the record for a new user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the record already exists.
    async fn create_progress(
        &self,
        user: &UserId,
        progress: &UserProgress,
    ) -> Result<(), StorageError>;

    /// Apply a completion as one atomic read-modify-write.
    ///
    /// Implementations must re-check, inside the same transaction, that the
    /// mode has not already been completed on `today`; a racing completion
    /// from a second session surfaces as `Conflict` instead of a lost update.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record is missing and
    /// `StorageError::Conflict` if the mode is already done for `today`.
    async fn apply_completion(
        &self,
        user: &UserId,
        mode: LessonMode,
        updated: &UserProgress,
        today: NaiveDate,
    ) -> Result<(), StorageError>;

    /// Persist a streak reset produced by the lazy evaluation on load.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record is missing.
    async fn save_streak_reset(
        &self,
        user: &UserId,
        updated: &UserProgress,
    ) -> Result<(), StorageError>;

    /// Change the user's lesson size.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record is missing.
    async fn update_daily_ayats(&self, user: &UserId, daily_ayats: u16)
    -> Result<(), StorageError>;

    /// Reset the record to new-user defaults, keeping the lesson size.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record is missing.
    async fn reset_progress(&self, user: &UserId) -> Result<(), StorageError>;

    /// Top records ordered by current streak, then longest streak, then
    /// total verses completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<(UserId, UserProgress)>, StorageError>;
}

/// Repository contract for threads, comments, and friendships.
#[async_trait]
pub trait SocialRepository: Send + Sync {
    /// Persist a new thread.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the thread cannot be stored.
    async fn insert_thread(&self, thread: &Thread) -> Result<(), StorageError>;

    /// Newest threads first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_threads(&self, limit: u32) -> Result<Vec<Thread>, StorageError>;

    /// Fetch a single thread.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for transient failures; a missing thread
    /// is `Ok(None)`.
    async fn get_thread(&self, id: ThreadId) -> Result<Option<Thread>, StorageError>;

    /// Persist a comment under an existing thread.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the thread does not exist.
    async fn insert_comment(&self, comment: &Comment) -> Result<(), StorageError>;

    /// Comments for a thread, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn comments_for_thread(&self, thread: ThreadId) -> Result<Vec<Comment>, StorageError>;

    /// Insert or update the friendship edge between the two users.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the edge cannot be stored.
    async fn upsert_friendship(&self, friendship: &Friendship) -> Result<(), StorageError>;

    /// The edge between two users, in either direction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn friendship_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, StorageError>;

    /// Every edge that involves the user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn friendships_for(&self, user: &UserId) -> Result<Vec<Friendship>, StorageError>;
}

/// Normalized key for the one friendship edge between two users.
fn pair_key(a: &UserId, b: &UserId) -> (UserId, UserId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<UserId, UserProgress>>>,
    threads: Arc<Mutex<Vec<Thread>>>,
    comments: Arc<Mutex<Vec<Comment>>>,
    friendships: Arc<Mutex<HashMap<(UserId, UserId), Friendship>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
        mutex
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn read_progress(&self, user: &UserId) -> Result<Option<UserProgress>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard.get(user).cloned())
    }

    async fn create_progress(
        &self,
        user: &UserId,
        progress: &UserProgress,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        if guard.contains_key(user) {
            return Err(StorageError::Conflict);
        }
        guard.insert(user.clone(), progress.clone());
        Ok(())
    }

    async fn apply_completion(
        &self,
        user: &UserId,
        mode: LessonMode,
        updated: &UserProgress,
        today: NaiveDate,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        let stored = guard.get(user).ok_or(StorageError::NotFound)?;
        if stored.completed_on(mode, today) {
            return Err(StorageError::Conflict);
        }
        guard.insert(user.clone(), updated.clone());
        Ok(())
    }

    async fn save_streak_reset(
        &self,
        user: &UserId,
        updated: &UserProgress,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        if !guard.contains_key(user) {
            return Err(StorageError::NotFound);
        }
        guard.insert(user.clone(), updated.clone());
        Ok(())
    }

    async fn update_daily_ayats(
        &self,
        user: &UserId,
        daily_ayats: u16,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        let stored = guard.get_mut(user).ok_or(StorageError::NotFound)?;
        stored
            .set_daily_ayats(daily_ayats)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(())
    }

    async fn reset_progress(&self, user: &UserId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        let stored = guard.get_mut(user).ok_or(StorageError::NotFound)?;
        let fresh = UserProgress::new_user(stored.daily_ayats())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        *stored = fresh;
        Ok(())
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<(UserId, UserProgress)>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        let mut rows: Vec<(UserId, UserProgress)> = guard
            .iter()
            .map(|(user, progress)| (user.clone(), progress.clone()))
            .collect();
        rows.sort_by(|(a_user, a), (b_user, b)| {
            (
                b.current_streak(),
                b.longest_streak(),
                b.total_verses_completed(),
            )
                .cmp(&(
                    a.current_streak(),
                    a.longest_streak(),
                    a.total_verses_completed(),
                ))
                .then_with(|| a_user.cmp(b_user))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

#[async_trait]
impl SocialRepository for InMemoryRepository {
    async fn insert_thread(&self, thread: &Thread) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.threads)?;
        guard.push(thread.clone());
        Ok(())
    }

    async fn list_threads(&self, limit: u32) -> Result<Vec<Thread>, StorageError> {
        let guard = Self::lock(&self.threads)?;
        let mut threads = guard.clone();
        threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        threads.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(threads)
    }

    async fn get_thread(&self, id: ThreadId) -> Result<Option<Thread>, StorageError> {
        let guard = Self::lock(&self.threads)?;
        Ok(guard.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        {
            let threads = Self::lock(&self.threads)?;
            if !threads.iter().any(|t| t.id == comment.thread_id) {
                return Err(StorageError::NotFound);
            }
        }
        let mut guard = Self::lock(&self.comments)?;
        guard.push(comment.clone());
        Ok(())
    }

    async fn comments_for_thread(&self, thread: ThreadId) -> Result<Vec<Comment>, StorageError> {
        let guard = Self::lock(&self.comments)?;
        let mut comments: Vec<Comment> = guard
            .iter()
            .filter(|c| c.thread_id == thread)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn upsert_friendship(&self, friendship: &Friendship) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.friendships)?;
        guard.insert(
            pair_key(&friendship.requester, &friendship.addressee),
            friendship.clone(),
        );
        Ok(())
    }

    async fn friendship_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, StorageError> {
        let guard = Self::lock(&self.friendships)?;
        Ok(guard.get(&pair_key(a, b)).cloned())
    }

    async fn friendships_for(&self, user: &UserId) -> Result<Vec<Friendship>, StorageError> {
        let guard = Self::lock(&self.friendships)?;
        let mut edges: Vec<Friendship> = guard
            .values()
            .filter(|f| f.involves(user))
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(edges)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub social: Arc<dyn SocialRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let social: Arc<dyn SocialRepository> = Arc::new(repo);
        Self { progress, social }
    }
}
