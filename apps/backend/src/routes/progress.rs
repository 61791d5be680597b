//! Learner progress endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/progress?userKey=
/// Load a learner's stored answers and study days
pub async fn load(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>> {
    let user_key = require_user_key(query.user_key.as_deref().unwrap_or_default())?;

    if !state.db.user_exists(user_key).await? {
        return Ok(Json(ProgressResponse::default()));
    }

    let answers = state.db.get_answers(user_key).await?;
    let study_days = state.db.get_study_days(user_key).await?;

    Ok(Json(ProgressResponse {
        answers: answers.iter().map(DbAnswer::to_record).collect(),
        study_days,
    }))
}

/// POST /api/progress
/// Replace a learner's answers and add study days
pub async fn save(
    State(state): State<AppState>,
    Json(payload): Json<SaveProgressRequest>,
) -> Result<Json<SaveProgressResponse>> {
    let user_key = require_user_key(&payload.user_key)?;
    let study_dates = parse_study_dates(&payload.study_dates)?;

    state
        .db
        .save_progress(user_key, &payload.answers, &study_dates)
        .await?;

    tracing::info!(
        "Saved progress for {}: {} answers, {} study days",
        user_key,
        payload.answers.len(),
        study_dates.len()
    );

    Ok(Json(SaveProgressResponse { success: true }))
}

fn require_user_key(raw: &str) -> Result<&str> {
    let user_key = raw.trim();
    if user_key.is_empty() {
        return Err(ApiError::BadRequest("userKey is required".to_string()));
    }
    Ok(user_key)
}

fn parse_study_dates(raw: &[String]) -> Result<Vec<NaiveDate>> {
    raw.iter()
        .map(|date| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest(format!("invalid study date: {}", date)))
        })
        .collect()
}
