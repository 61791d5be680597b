//! Server configuration read from the environment.

use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_QUESTIONS_PATH: &str = "public/spread_all.md";

/// Runtime settings for the HTTP service.
///
/// Object storage is configured separately, see
/// [`StorageService::from_env`](crate::services::storage::StorageService::from_env).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Shared secret for the instructor report. The report is unreachable when unset.
    pub teacher_token: Option<String>,
    pub host: String,
    pub port: u16,
    pub questions_path: PathBuf,
}

impl Config {
    /// Read `DATABASE_URL`, `TEACHER_SECRET_TOKEN`, `HOST`, `PORT` and `QUESTIONS_PATH`.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let teacher_token = std::env::var("TEACHER_SECRET_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().with_context(|| format!("PORT is not a valid port: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let questions_path = std::env::var("QUESTIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_QUESTIONS_PATH));

        Ok(Self {
            database_url,
            teacher_token,
            host,
            port,
            questions_path,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            teacher_token: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            questions_path: PathBuf::from(DEFAULT_QUESTIONS_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_default_has_no_teacher_token() {
        let config = Config::default();
        assert!(config.teacher_token.is_none());
        assert_eq!(config.questions_path, PathBuf::from("public/spread_all.md"));
    }
}
