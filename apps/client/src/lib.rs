//! Terminal client for the spread quiz.
//!
//! Loads the question document once, then drives a [`QuizSession`] from
//! line commands. Progress is kept in a local SQLite store and pushed to the
//! backend in the background.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod render;
pub mod state;
pub mod sync;

use commands::Outcome;
use config::ClientConfig;
use db::{date_utils, SqliteRepository};
use error::ClientError;
use quiz_core::QuizSession;
use state::AppState;
use std::io::Write;
use sync::SyncClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they stay out of the quiz output.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let sync = config.backend_url.as_deref().map(SyncClient::new);

    let entries = commands::document::load_entries(&config, sync.as_ref()).await?;

    if let Some(sync) = &sync {
        match sync.check_connectivity().await {
            Ok(true) => tracing::info!(url = sync.backend_url(), "backend reachable"),
            Ok(false) | Err(_) => tracing::warn!(url = sync.backend_url(), "backend not reachable"),
        }
    }

    let repository = SqliteRepository::open(&config.db_path).map_err(ClientError::Database)?;
    tracing::info!(path = %config.db_path.display(), "progress store opened");

    let session = QuizSession::with_offset(entries, date_utils::local_offset());
    let mut state = AppState::new(session, repository, sync, config.user_key);

    println!("{}", render::screen(&state.session));
    println!("Type `help` for commands.");
    command_loop(&mut state).await
}

async fn command_loop(state: &mut AppState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        state.drain_sync_events();

        let outcome = match commands::parse(&line) {
            Ok(Some(command)) => commands::execute(state, command),
            Ok(None) => continue,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Print(text)) => println!("{text}"),
            Err(e) => println!("error: {e}"),
        }

        state.drain_sync_events();
        for report in state.take_reports() {
            println!("{report}");
        }
        if let Some(text) = render::notices(state.notices()) {
            println!("{text}");
        }
    }

    Ok(())
}
