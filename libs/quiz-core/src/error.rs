//! Error types for quiz-core.

use thiserror::Error;

use crate::session::Phase;

/// Result type alias using QuizError.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Errors raised when turning a document into questions.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("empty document")]
    EmptyDocument,

    #[error("no extractable questions; check the document format")]
    NoQuestions,
}

/// Errors raised by the session state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("action {action} is not allowed in phase {phase:?}")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("no questions match the current filter")]
    EmptyView,

    #[error("unknown question id: {0}")]
    UnknownQuestion(String),

    #[error("option {0} is not offered for this question")]
    UnknownOption(String),
}

/// Errors raised while reading persisted progress.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("malformed progress data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported progress version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("progress entry is not an object")]
    NotAnObject,
}
