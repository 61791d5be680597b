//! Instructor report endpoint

use axum::{extract::State, Json};
use quiz_core::{AnswerRow, LearnerRow, StudyDayRow};

use crate::error::Result;
use crate::models::TeacherResponse;
use crate::AppState;

/// GET /api/teacher?token=
/// Per-learner summaries, newest learner first. Guarded by `teacher_guard`.
pub async fn report(State(state): State<AppState>) -> Result<Json<TeacherResponse>> {
    let users = state.db.list_users().await?;
    let answers = state.db.list_answers().await?;
    let study_days = state.db.list_study_days().await?;

    let learners: Vec<LearnerRow> = users.into_iter().map(Into::into).collect();
    let answers: Vec<AnswerRow> = answers.into_iter().map(Into::into).collect();
    let study_days: Vec<StudyDayRow> = study_days.into_iter().map(Into::into).collect();

    let users = quiz_core::aggregate(&learners, &answers, &study_days);
    tracing::info!("Instructor report for {} learners", users.len());

    Ok(Json(TeacherResponse { users }))
}
