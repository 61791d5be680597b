//! Background progress sync with the backend.

use chrono::{NaiveDate, Utc};
use quiz_core::{AnswerRecord, LearnerSummary, ProgressSnapshot};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Sync errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Outcome of a spawned sync task, drained by the command loop.
#[derive(Debug)]
pub enum SyncEvent {
    Pushed { user_key: String },
    Pulled { user_key: String, snapshot: Option<ProgressSnapshot> },
    Report { users: Vec<LearnerSummary> },
    Failed { message: String },
}

// === API Request/Response Types ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveProgressRequest<'a> {
    user_key: &'a str,
    answers: &'a [AnswerRecord],
    study_dates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SaveProgressResponse {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    users: Vec<LearnerSummary>,
}

/// Stored progress as the backend returns it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProgress {
    pub answers: Vec<AnswerRecord>,
    pub study_days: Vec<NaiveDate>,
}

impl RemoteProgress {
    /// Convert to a snapshot; answers arrive oldest first, so later ones win.
    /// `None` when the backend has nothing for this learner.
    pub fn into_snapshot(self) -> Option<ProgressSnapshot> {
        if self.answers.is_empty() && self.study_days.is_empty() {
            return None;
        }

        let mut history: Vec<AnswerRecord> = Vec::with_capacity(self.answers.len());
        for answer in self.answers {
            history.retain(|existing| existing.question_id != answer.question_id);
            history.push(answer);
        }

        Some(ProgressSnapshot {
            history,
            study_dates: self.study_days,
            saved_at: Some(Utc::now()),
            ..ProgressSnapshot::default()
        })
    }
}

struct SyncClientInner {
    client: Client,
    backend_url: String,
}

/// HTTP client for the progress and document endpoints.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<SyncClientInner>,
}

impl SyncClient {
    pub fn new(backend_url: impl Into<String>) -> Self {
        let backend_url: String = backend_url.into();
        Self {
            inner: Arc::new(SyncClientInner {
                client: Client::new(),
                backend_url: backend_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.inner.backend_url
    }

    /// Check if backend is reachable.
    pub async fn check_connectivity(&self) -> Result<bool, SyncError> {
        let url = format!("{}/health", self.inner.backend_url);
        match self.inner.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => Err(SyncError::Network(e.to_string())),
        }
    }

    /// Fetch the markdown question document.
    pub async fn fetch_document(&self) -> Result<String, SyncError> {
        let url = format!("{}/api/document", self.inner.backend_url);

        let resp = self
            .inner
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Backend { status, message });
        }

        resp.text().await.map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Replace the learner's stored answers and add their study days.
    pub async fn push_progress(
        &self,
        user_key: &str,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), SyncError> {
        let url = format!("{}/api/progress", self.inner.backend_url);
        let request = SaveProgressRequest {
            user_key,
            answers: &snapshot.history,
            study_dates: study_date_strings(&snapshot.study_dates),
        };

        let resp = self
            .inner
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Backend { status, message });
        }

        let response: SaveProgressResponse = resp
            .json()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))?;

        if !response.success {
            return Err(SyncError::Parse("backend reported an unsuccessful save".into()));
        }
        Ok(())
    }

    /// Fetch the learner's stored answers and study days.
    pub async fn pull_progress(&self, user_key: &str) -> Result<RemoteProgress, SyncError> {
        let url = format!("{}/api/progress", self.inner.backend_url);

        let resp = self
            .inner
            .client
            .get(&url)
            .query(&[("userKey", user_key)])
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Backend { status, message });
        }

        resp.json()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Fetch the instructor report. A bad or missing token is a 401.
    pub async fn fetch_report(&self, token: &str) -> Result<Vec<LearnerSummary>, SyncError> {
        let url = format!("{}/api/teacher", self.inner.backend_url);

        let resp = self
            .inner
            .client
            .get(&url)
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Backend { status, message });
        }

        let response: ReportResponse = resp
            .json()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))?;
        Ok(response.users)
    }

    /// Fetch the report in a spawned task; the outcome is sent to `events`.
    pub fn spawn_report(&self, token: String, events: UnboundedSender<SyncEvent>) {
        let client = self.clone();
        tokio::spawn(async move {
            let event = match client.fetch_report(&token).await {
                Ok(users) => {
                    tracing::info!(learners = users.len(), "instructor report fetched");
                    SyncEvent::Report { users }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "instructor report failed");
                    SyncEvent::Failed {
                        message: report_failure_message(&e),
                    }
                }
            };
            let _ = events.send(event);
        });
    }

    /// Push in a spawned task; the outcome is sent to `events`.
    pub fn spawn_push(
        &self,
        user_key: String,
        snapshot: ProgressSnapshot,
        events: UnboundedSender<SyncEvent>,
    ) {
        let client = self.clone();
        tokio::spawn(async move {
            let event = match client.push_progress(&user_key, &snapshot).await {
                Ok(()) => {
                    tracing::info!(%user_key, answers = snapshot.history.len(), "progress pushed");
                    SyncEvent::Pushed { user_key }
                }
                Err(e) => {
                    tracing::warn!(%user_key, error = %e, "progress push failed");
                    SyncEvent::Failed {
                        message: format!("Could not save progress to the server: {e}"),
                    }
                }
            };
            // The receiver is gone only when the client is shutting down.
            let _ = events.send(event);
        });
    }

    /// Pull in a spawned task; the outcome is sent to `events`.
    pub fn spawn_pull(&self, user_key: String, events: UnboundedSender<SyncEvent>) {
        let client = self.clone();
        tokio::spawn(async move {
            let event = match client.pull_progress(&user_key).await {
                Ok(remote) => {
                    tracing::info!(%user_key, answers = remote.answers.len(), "progress pulled");
                    SyncEvent::Pulled {
                        user_key,
                        snapshot: remote.into_snapshot(),
                    }
                }
                Err(e) => {
                    tracing::warn!(%user_key, error = %e, "progress pull failed");
                    SyncEvent::Failed {
                        message: format!("Could not load progress from the server: {e}"),
                    }
                }
            };
            let _ = events.send(event);
        });
    }
}

fn report_failure_message(error: &SyncError) -> String {
    match error {
        SyncError::Backend { status: 401, .. } => {
            "Instructor access denied: the token was rejected.".to_string()
        }
        other => format!("Could not fetch the instructor report: {other}"),
    }
}

fn study_date_strings(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(id: &str, correct: bool, hour: u32) -> AnswerRecord {
        AnswerRecord {
            question_id: id.to_string(),
            selected: vec!["1".to_string()],
            is_correct: correct,
            answered_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            chapter: None,
            source: None,
        }
    }

    #[test]
    fn test_backend_url_trailing_slash_trimmed() {
        let client = SyncClient::new("http://localhost:3000/");
        assert_eq!(client.backend_url(), "http://localhost:3000");
    }

    #[test]
    fn test_save_request_shape() {
        let answers = vec![record("1-1", true, 9)];
        let request = SaveProgressRequest {
            user_key: "alice",
            answers: &answers,
            study_dates: study_date_strings(&[NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()]),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["userKey"], "alice");
        assert_eq!(value["answers"][0]["questionId"], "1-1");
        assert_eq!(value["studyDates"], serde_json::json!(["2024-05-01"]));
    }

    #[test]
    fn test_empty_remote_progress_has_no_snapshot() {
        assert!(RemoteProgress::default().into_snapshot().is_none());
    }

    #[test]
    fn test_remote_progress_later_answers_win() {
        let remote = RemoteProgress {
            answers: vec![record("1-1", false, 9), record("2-1", true, 10), record("1-1", true, 11)],
            study_days: vec![NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()],
        };

        let snapshot = remote.into_snapshot().unwrap();
        let ids: Vec<_> = snapshot.history.iter().map(|r| r.question_id.as_str()).collect();
        assert_eq!(ids, vec!["2-1", "1-1"]);
        assert!(snapshot.history[1].is_correct);
        assert_eq!(snapshot.study_dates.len(), 1);
    }

    #[test]
    fn test_report_body_parses() {
        let body = r#"{"users": [{"userKey": "alice", "createdAt": "2024-05-01T09:00:00Z", "totalAnswers": 2, "correctAnswers": 1, "accuracy": 50, "studyDaysCount": 1, "latestActivity": "2024-05-01T10:00:00Z", "chapterStats": {"第1章": {"correct": 1, "total": 2, "questions": [{"questionId": "1-1", "isCorrect": true}, {"questionId": "1-2", "isCorrect": false}]}}, "wrongQuestions": [{"questionId": "1-2", "wrongCount": 1, "chapter": "第1章"}]}]}"#;
        let response: ReportResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.users.len(), 1);
        assert_eq!(response.users[0].user_key, "alice");
        assert_eq!(response.users[0].chapter_stats["第1章"].total, 2);
        assert_eq!(response.users[0].wrong_questions[0].question_id, "1-2");
    }

    #[test]
    fn test_rejected_token_message() {
        let rejected = SyncError::Backend {
            status: 401,
            message: r#"{"error":"unauthorized","message":"invalid token"}"#.to_string(),
        };
        assert_eq!(
            report_failure_message(&rejected),
            "Instructor access denied: the token was rejected."
        );

        let offline = SyncError::Network("connection refused".to_string());
        assert!(report_failure_message(&offline).starts_with("Could not fetch the instructor report"));
    }

    #[test]
    fn test_remote_progress_parses_backend_body() {
        let body = r#"{"answers": [{"questionId": "1-1", "selected": ["2"], "isCorrect": false, "answeredAt": "2024-05-01T10:00:00Z", "chapter": "第1章"}], "studyDays": ["2024-05-01"]}"#;
        let remote: RemoteProgress = serde_json::from_str(body).unwrap();
        assert_eq!(remote.answers[0].chapter.as_deref(), Some("第1章"));
        assert_eq!(remote.study_days, vec![NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()]);
    }
}
