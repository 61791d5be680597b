//! Client error types.

use crate::db::DbError;
use crate::sync::SyncError;
use quiz_core::QuizError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the client before the quiz starts.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no question document configured; set QUIZ_DOCUMENT or QUIZ_BACKEND_URL")]
    NoDocumentSource,

    #[error("failed to read {}: {source}", .path.display())]
    ReadDocument {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to fetch the question document: {0}")]
    FetchDocument(#[from] SyncError),

    #[error(transparent)]
    Questions(#[from] QuizError),

    #[error("failed to open local progress store: {0}")]
    Database(#[from] DbError),
}
