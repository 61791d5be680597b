//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use quiz_core::{AnswerRecord, LearnerSummary};
use quiz_core::{AnswerRow, LearnerRow, StudyDayRow};

pub use crate::services::document::QuestionView;

// === Database Entity Types ===

/// Learner registered by a progress save
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub user_key: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbUser> for LearnerRow {
    fn from(user: DbUser) -> Self {
        LearnerRow {
            user_key: user.user_key,
            created_at: user.created_at,
        }
    }
}

/// Answer row in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAnswer {
    pub user_key: String,
    pub question_id: String,
    pub selected: Vec<String>,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
    pub chapter: Option<String>,
    pub source: Option<String>,
}

impl DbAnswer {
    /// Convert to the wire record
    pub fn to_record(&self) -> AnswerRecord {
        AnswerRecord {
            question_id: self.question_id.clone(),
            selected: self.selected.clone(),
            is_correct: self.is_correct,
            answered_at: self.answered_at,
            chapter: self.chapter.clone(),
            source: self.source.clone(),
        }
    }
}

impl From<DbAnswer> for AnswerRow {
    fn from(answer: DbAnswer) -> Self {
        AnswerRow {
            user_key: answer.user_key,
            question_id: answer.question_id,
            is_correct: answer.is_correct,
            chapter: answer.chapter,
            answered_at: answer.answered_at,
        }
    }
}

/// Study day row in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbStudyDay {
    pub user_key: String,
    pub study_date: NaiveDate,
}

impl From<DbStudyDay> for StudyDayRow {
    fn from(day: DbStudyDay) -> Self {
        StudyDayRow {
            user_key: day.user_key,
            study_date: day.study_date,
        }
    }
}

// === Progress API Types ===

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub user_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub user_key: String,
    pub answers: Vec<AnswerRecord>,
    /// `YYYY-MM-DD`
    pub study_dates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProgressResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub answers: Vec<AnswerRecord>,
    pub study_days: Vec<NaiveDate>,
}

// === Instructor API Types ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherResponse {
    pub users: Vec<LearnerSummary>,
}

// === Upload API Types ===

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub path: String,
    pub sha256: String,
}

// === Question API Types ===

#[derive(Debug, Clone, Serialize)]
pub struct QuestionsResponse {
    pub total: usize,
    pub questions: Vec<QuestionView>,
}
