//! Application state.

use crate::db::SqliteRepository;
use crate::render;
use crate::sync::{SyncClient, SyncEvent};
use quiz_core::QuizSession;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message shown after every command until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything the command loop works on.
pub struct AppState {
    pub session: QuizSession,
    pub repository: SqliteRepository,
    pub sync: Option<SyncClient>,
    pub user_key: Option<String>,
    notices: Vec<Notice>,
    reports: Vec<String>,
    events_tx: UnboundedSender<SyncEvent>,
    events_rx: UnboundedReceiver<SyncEvent>,
}

impl AppState {
    pub fn new(
        session: QuizSession,
        repository: SqliteRepository,
        sync: Option<SyncClient>,
        user_key: Option<String>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session,
            repository,
            sync,
            user_key,
            notices: Vec::new(),
            reports: Vec::new(),
            events_tx,
            events_rx,
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notices.push(Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "error notice");
        self.notices.push(Notice {
            level: NoticeLevel::Error,
            message,
        });
    }

    /// Clear every notice, returning how many were shown.
    pub fn dismiss(&mut self) -> usize {
        std::mem::take(&mut self.notices).len()
    }

    /// Rendered instructor reports that arrived since the last call.
    pub fn take_reports(&mut self) -> Vec<String> {
        std::mem::take(&mut self.reports)
    }

    /// Sender handed to spawned sync tasks.
    pub fn sync_events(&self) -> UnboundedSender<SyncEvent> {
        self.events_tx.clone()
    }

    /// Apply finished sync tasks. Failures only add notices; session state is kept.
    pub fn drain_sync_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_sync_event(event);
        }
    }

    fn apply_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Pushed { user_key } => {
                self.info(format!("Progress for {user_key} saved to the server."));
            }
            SyncEvent::Pulled { user_key, snapshot } => {
                if self.user_key.as_deref() != Some(user_key.as_str()) {
                    tracing::debug!(%user_key, "ignoring pull for a previous learner");
                    return;
                }
                match snapshot {
                    Some(snapshot) => {
                        self.session.restore(snapshot);
                        self.info(format!("Progress for {user_key} restored from the server."));
                    }
                    None => self.info(format!("No saved progress for {user_key}.")),
                }
            }
            SyncEvent::Report { users } => self.reports.push(render::report(&users)),
            SyncEvent::Failed { message } => self.error(message),
        }
    }
}
