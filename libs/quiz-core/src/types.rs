//! Core types for the spread quiz.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chapter assigned to entries that have no preceding chapter heading.
pub const UNCLASSIFIED_CHAPTER: &str = "未分類";

/// Chapter filter value that selects every chapter.
pub const ALL_CHAPTERS: &str = "すべて";

/// Canonical "true" glyph.
pub const OX_TRUE: &str = "〇";

/// Canonical "false" glyph.
pub const OX_FALSE: &str = "✕";

/// One question extracted from a spread block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    pub id: String,
    pub statement: String,
    pub answer: String,
    pub answer_tokens: Vec<String>,
    pub raw_left: String,
    pub question_body: String,
    pub explanation: String,
    pub chapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl QuestionEntry {
    /// Statement and body joined, used for phrase detection.
    pub fn full_text(&self) -> String {
        format!("{}\n{}", self.statement, self.question_body)
    }
}

/// Chapter heading found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMarker {
    pub offset: usize,
    pub title: String,
}

/// How a question is answered and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// True/false with the 〇 / ✕ glyphs.
    Ox,
    /// Several options must be selected.
    Multi,
    /// Exactly one option.
    Choice,
}

impl Default for QuestionType {
    fn default() -> Self {
        Self::Choice
    }
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ox => "ox",
            Self::Multi => "multi",
            Self::Choice => "choice",
        }
    }
}

/// Selectable option rendered for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub label: String,
}

/// Latest attempt at a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub selected: Vec<String>,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
