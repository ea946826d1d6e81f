use thiserror::Error;

use crate::engine::CompletionError;
use crate::model::{ProgressError, ThreadError, VerseKeyError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    VerseKey(#[from] VerseKeyError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Thread(#[from] ThreadError),
}
