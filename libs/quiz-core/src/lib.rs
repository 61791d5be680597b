//! Core library for the spread quiz, shared by the backend and the client.
//!
//! Provides:
//! - Parser for spread-format markdown question documents
//! - Question type inference, answer evaluation and option derivation
//! - The quiz session state machine
//! - Versioned persisted progress records
//! - Per-learner aggregation for the instructor report

pub mod error;
pub mod matching;
pub mod parser;
pub mod progress;
pub mod session;
pub mod stats;
pub mod types;

pub use error::{ProgressError, QuizError, Result, SessionError};
pub use matching::{compare_selection, derive_options, evaluate, infer_question_type, question_type, MatchResult};
pub use parser::text::canonical_ox;
pub use parser::{load_questions, parse};
pub use progress::{ProgressBook, ProgressSnapshot, CURRENT_VERSION, PROGRESS_NAMESPACE};
pub use session::{Action, Phase, QuizSession, SessionStats};
pub use stats::{
    aggregate, accuracy_percent, AnswerRow, ChapterStats, LearnerRow, LearnerSummary, QuestionResult, StudyDayRow,
    WrongQuestion,
};
pub use types::{
    AnswerOption, AnswerRecord, ChapterMarker, QuestionEntry, QuestionType, ALL_CHAPTERS, OX_FALSE, OX_TRUE,
    UNCLASSIFIED_CHAPTER,
};
