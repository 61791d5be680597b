//! Upload utility endpoint

use axum::{extract::State, Json};

use crate::error::{ApiError, Result};
use crate::models::{UploadRequest, UploadResponse};
use crate::services::storage::{hash_content, StorageError};
use crate::AppState;

const UPLOAD_CONTENT_TYPE: &str = "application/json";

/// POST /api/upload
/// Store `content` under `name` in the configured bucket
pub async fn upload(
    State(state): State<AppState>,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<UploadResponse>> {
    let (name, content) = match (payload.name, payload.content) {
        (Some(name), Some(content)) if !name.is_empty() && !content.is_empty() => (name, content),
        _ => {
            return Err(ApiError::BadRequest("name and content are required".to_string()));
        }
    };

    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| StorageError::Config("S3_BUCKET not set".to_string()))?;

    let key = storage
        .upload_file(&name, content.as_bytes(), Some(UPLOAD_CONTENT_TYPE))
        .await?;

    let path = format!("{}/{}", storage.bucket(), key);
    Ok(Json(UploadResponse {
        message: format!("Uploaded to s3://{}", path),
        path,
        sha256: hash_content(&content),
    }))
}
