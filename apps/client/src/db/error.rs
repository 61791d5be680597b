//! Database error types.

use quiz_core::ProgressError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid progress data: {0}")]
    Progress(#[from] ProgressError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
