//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::engine::CompletionError;
use quest_core::model::{CommentError, ProgressError, ThreadError};
use quest_storage::repository::StorageError;
use quest_storage::sqlite::SqliteInitError;

/// Errors emitted by the verse content source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("content response could not be decoded: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson window size must be at least 1")]
    InvalidCount,
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SocialService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SocialServiceError {
    #[error("users cannot befriend themselves")]
    SelfFriendship,
    #[error("a friendship between these users already exists")]
    DuplicateFriendship,
    #[error("no pending request between these users")]
    NoPendingRequest,
    #[error("thread not found")]
    ThreadNotFound,
    #[error(transparent)]
    Thread(#[from] ThreadError),
    #[error(transparent)]
    Comment(#[from] CommentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
