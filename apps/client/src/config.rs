//! Client configuration read from the environment.

use std::path::PathBuf;

/// Where the client gets its document and keeps its data.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Local markdown document. Takes precedence over the backend copy.
    pub document: Option<PathBuf>,
    /// Backend base URL for the document and progress sync.
    pub backend_url: Option<String>,
    /// Learner key used by `save` and `load` until `user` changes it.
    pub user_key: Option<String>,
    pub db_path: PathBuf,
}

impl ClientConfig {
    /// Read `QUIZ_DOCUMENT`, `QUIZ_BACKEND_URL`, `QUIZ_USER` and `QUIZ_DB_PATH`.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|value| !value.trim().is_empty());

        Self {
            document: non_empty("QUIZ_DOCUMENT").map(PathBuf::from),
            backend_url: non_empty("QUIZ_BACKEND_URL"),
            user_key: non_empty("QUIZ_USER").map(|key| key.trim().to_string()),
            db_path: non_empty("QUIZ_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
        }
    }
}

/// `<local data dir>/spread-quiz/progress.db`, or the current directory as a fallback.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spread-quiz")
        .join("progress.db")
}
