//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up the router with or without a database
//! - Helper functions for creating test data
//!
//! # Requirements
//! Tests built with [`TestContext::new`] require a PostgreSQL database
//! (set DATABASE_URL env var). [`TestContext::offline`] uses a lazily
//! connected pool and works without one, as long as the request never
//! reaches the database.

pub mod fixtures;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;

use spread_quiz_backend::config::Config;
use spread_quiz_backend::db::Database;
use spread_quiz_backend::AppState;

pub const TEACHER_TOKEN: &str = "test-teacher-token";

/// Test context containing database connection and router.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context backed by a real database.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self::build(db, Some(fixtures::sample_document()))
    }

    /// Create a context whose pool never connects.
    pub fn offline() -> Self {
        Self::offline_with_document(Some(fixtures::sample_document()))
    }

    /// Offline context serving the given document (or none).
    pub fn offline_with_document(document: Option<String>) -> Self {
        let db = Database::connect_lazy("postgres://localhost:1/unused")
            .expect("Failed to create lazy pool");

        Self::build(db, document)
    }

    fn build(db: Database, document: Option<String>) -> Self {
        let db = Arc::new(db);

        let config = Config {
            teacher_token: Some(TEACHER_TOKEN.to_string()),
            questions_path: PathBuf::from("tests/spread_all.md"),
            ..Config::default()
        };

        let state = AppState {
            db: db.clone(),
            storage: None,
            config: Arc::new(config),
            document: document.map(Arc::new),
        };

        let app = spread_quiz_backend::router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Clean up test data for a learner.
    ///
    /// Call this after tests to remove test data.
    pub async fn cleanup_user(&self, user_key: &str) {
        let _ = self.db.delete_user(user_key).await;
    }
}
