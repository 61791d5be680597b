pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::document::read_document;
use crate::services::storage::{StorageError, StorageService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// `None` when no bucket is configured; uploads then fail.
    pub storage: Option<Arc<StorageService>>,
    pub config: Arc<Config>,
    /// Markdown served to clients. `None` when the file was not found at startup.
    pub document: Option<Arc<String>>,
}

/// Build the router with every route and layer.
pub fn router(state: AppState) -> Router {
    let teacher_routes = Router::new()
        .route("/api/teacher", get(routes::teacher::report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::teacher_guard,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/progress",
            get(routes::progress::load).post(routes::progress::save),
        )
        .route("/api/upload", post(routes::upload::upload))
        .route("/api/document", get(routes::questions::document))
        .route("/api/questions", get(routes::questions::list))
        .merge(teacher_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    tracing::info!("Initializing S3 storage...");
    let storage = match StorageService::from_env().await {
        Ok(storage) => Some(Arc::new(storage)),
        Err(StorageError::Config(reason)) => {
            tracing::warn!("Upload disabled: {}", reason);
            None
        }
        Err(e) => return Err(e.into()),
    };

    if config.teacher_token.is_none() {
        tracing::warn!("TEACHER_SECRET_TOKEN not set; instructor report is disabled");
    }

    let document = read_document(&config.questions_path).await?;
    match &document {
        Some(markdown) => match quiz_core::load_questions(markdown) {
            Ok(entries) => tracing::info!(
                "Loaded {} questions from {}",
                entries.len(),
                config.questions_path.display()
            ),
            Err(e) => tracing::warn!("{}: {}", config.questions_path.display(), e),
        },
        None => tracing::warn!(
            "Question document not found at {}",
            config.questions_path.display()
        ),
    }

    let addr = config.bind_addr();
    let state = AppState {
        db: Arc::new(db),
        storage,
        config: Arc::new(config),
        document: document.map(Arc::new),
    };

    let app = router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
