//! Loading the question document at startup.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::sync::SyncClient;
use quiz_core::{load_questions, QuestionEntry};

/// Read the markdown from the local path if configured, else from the backend.
pub async fn fetch_markdown(
    config: &ClientConfig,
    sync: Option<&SyncClient>,
) -> Result<String, ClientError> {
    if let Some(path) = &config.document {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ClientError::ReadDocument {
                path: path.clone(),
                source,
            });
    }

    match sync {
        Some(sync) => Ok(sync.fetch_document().await?),
        None => Err(ClientError::NoDocumentSource),
    }
}

/// Load and parse the document. Zero entries is an error.
pub async fn load_entries(
    config: &ClientConfig,
    sync: Option<&SyncClient>,
) -> Result<Vec<QuestionEntry>, ClientError> {
    let markdown = fetch_markdown(config, sync).await?;
    let entries = load_questions(&markdown)?;
    tracing::info!(count = entries.len(), "questions loaded");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::QuizError;
    use std::path::PathBuf;

    fn config_with_document(path: PathBuf) -> ClientConfig {
        ClientConfig {
            document: Some(path),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_no_source_configured() {
        let err = load_entries(&ClientConfig::default(), None).await.unwrap_err();
        assert!(matches!(err, ClientError::NoDocumentSource));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let config = config_with_document(PathBuf::from("/nonexistent/spread_all.md"));
        let err = load_entries(&config, None).await.unwrap_err();
        assert!(matches!(err, ClientError::ReadDocument { .. }));
    }

    #[tokio::test]
    async fn test_document_without_blocks() {
        let path = std::env::temp_dir().join(format!("spread-quiz-empty-{}.md", std::process::id()));
        tokio::fs::write(&path, "# 見出しだけ\n本文のみ\n").await.unwrap();

        let err = load_entries(&config_with_document(path.clone()), None)
            .await
            .unwrap_err();
        let _ = tokio::fs::remove_file(&path).await;

        assert!(matches!(err, ClientError::Questions(QuizError::NoQuestions)));
    }
}
