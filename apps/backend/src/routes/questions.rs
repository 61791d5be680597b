//! Question document endpoints

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::QuestionsResponse;
use crate::services::document::question_views;
use crate::AppState;

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

fn loaded_document(state: &AppState) -> Result<&str> {
    state
        .document
        .as_deref()
        .map(String::as_str)
        .ok_or_else(|| ApiError::NotFound("question document is not loaded".to_string()))
}

/// GET /api/document
/// The raw markdown document
pub async fn document(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let markdown = loaded_document(&state)?.to_string();
    Ok(([(CONTENT_TYPE, MARKDOWN_CONTENT_TYPE)], markdown))
}

/// GET /api/questions
/// Parsed questions with their type and options
pub async fn list(State(state): State<AppState>) -> Result<Json<QuestionsResponse>> {
    let questions = question_views(loaded_document(&state)?)?;

    Ok(Json(QuestionsResponse {
        total: questions.len(),
        questions,
    }))
}
