//! Shared-secret guard for the instructor report

use axum::{
    body::Body,
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, Result};
use crate::models::TeacherQuery;
use crate::AppState;

/// Check a presented token against the configured secret.
///
/// Always fails when no secret is configured.
pub fn verify_teacher_token(expected: Option<&str>, presented: Option<&str>) -> Result<()> {
    match (expected, presented) {
        (Some(expected), Some(presented)) if expected == presented => Ok(()),
        (None, _) => Err(ApiError::Unauthorized("instructor access is disabled".to_string())),
        _ => Err(ApiError::Unauthorized("invalid token".to_string())),
    }
}

/// Auth middleware - reads the `token` query parameter
pub async fn teacher_guard(State(state): State<AppState>, request: Request<Body>, next: Next) -> Result<Response> {
    let presented = Query::<TeacherQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.token);

    if let Err(e) = verify_teacher_token(state.config.teacher_token.as_deref(), presented.as_deref()) {
        tracing::warn!("Rejected instructor request: {}", e);
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_token_passes() {
        assert!(verify_teacher_token(Some("secret"), Some("secret")).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_token_fails() {
        assert!(verify_teacher_token(Some("secret"), Some("guess")).is_err());
        assert!(verify_teacher_token(Some("secret"), None).is_err());
    }

    #[test]
    fn test_unset_secret_always_fails() {
        assert!(verify_teacher_token(None, None).is_err());
        assert!(verify_teacher_token(None, Some("")).is_err());
    }
}
