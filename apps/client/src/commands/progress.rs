//! Learner key, progress persistence and statistics commands.
//!
//! Persistence problems never fail the command; they are reported as notices
//! and the in-memory session is left as it was.

use crate::db::date_utils;
use crate::db::ProgressRepository;
use crate::render;
use crate::state::AppState;
use chrono::Utc;

const NO_USER: &str = "Set a learner key with `user <key>` first.";

pub fn set_user(state: &mut AppState, key: String) -> String {
    let message = format!("Learner key set to {key}.");
    state.user_key = Some(key);
    message
}

/// Store the session under the learner key, then push it to the backend.
pub fn save(state: &mut AppState) -> String {
    let Some(user_key) = state.user_key.clone() else {
        state.error(NO_USER);
        return render::screen(&state.session);
    };

    let snapshot = state.session.snapshot(Utc::now());
    if let Err(e) = state.repository.save_snapshot(&user_key, &snapshot) {
        state.error(format!("Could not save progress locally: {e}"));
        return render::screen(&state.session);
    }
    tracing::info!(%user_key, answers = snapshot.history.len(), "progress saved locally");
    state.info(format!("Progress for {user_key} saved."));

    if let Some(sync) = &state.sync {
        sync.spawn_push(user_key, snapshot, state.sync_events());
    }
    render::screen(&state.session)
}

/// Restore the learner's local snapshot, or ask the backend when there is none.
pub fn load(state: &mut AppState) -> String {
    let Some(user_key) = state.user_key.clone() else {
        state.error(NO_USER);
        return render::screen(&state.session);
    };

    match state.repository.load_snapshot(&user_key) {
        Ok(Some(snapshot)) => {
            state.session.restore(snapshot);
            state.info(format!("Progress for {user_key} loaded."));
        }
        Ok(None) => match &state.sync {
            Some(sync) => {
                sync.spawn_pull(user_key.clone(), state.sync_events());
                state.info(format!("No local progress for {user_key}; checking the server."));
            }
            None => state.info(format!("No saved progress for {user_key}.")),
        },
        Err(e) => state.error(format!("Could not load progress: {e}")),
    }
    render::screen(&state.session)
}

pub fn stats(state: &AppState) -> String {
    render::stats(&state.session, date_utils::today())
}

/// Ask the backend for the instructor report; it is printed when it arrives.
pub fn report(state: &mut AppState, token: String) -> String {
    match &state.sync {
        Some(sync) => {
            sync.spawn_report(token, state.sync_events());
            "Fetching the instructor report...".to_string()
        }
        None => {
            state.error("The instructor report needs a backend (set QUIZ_BACKEND_URL).");
            render::screen(&state.session)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{KeyValueRepository, SqliteRepository};
    use crate::state::NoticeLevel;
    use quiz_core::{Action, QuestionEntry, QuizSession, PROGRESS_NAMESPACE};

    fn entry(id: &str) -> QuestionEntry {
        QuestionEntry {
            id: id.to_string(),
            statement: format!("{id} の問題"),
            answer: "1".to_string(),
            answer_tokens: vec!["1".to_string()],
            raw_left: String::new(),
            question_body: "1. A\n2. B".to_string(),
            explanation: String::new(),
            chapter: "第1章".to_string(),
            source: None,
        }
    }

    fn state(user_key: Option<&str>) -> AppState {
        AppState::new(
            QuizSession::new(vec![entry("1-1"), entry("1-2")]),
            SqliteRepository::open_in_memory().unwrap(),
            None,
            user_key.map(str::to_string),
        )
    }

    #[test]
    fn test_save_without_user_is_a_notice() {
        let mut state = state(None);
        save(&mut state);
        assert_eq!(state.notices()[0].level, NoticeLevel::Error);
        assert_eq!(state.notices()[0].message, NO_USER);
    }

    #[test]
    fn test_save_then_load_restores_history() {
        let mut state = state(Some("alice"));
        state.session.dispatch(Action::Start, Utc::now()).unwrap();
        state.session.dispatch(Action::Select("1".into()), Utc::now()).unwrap();
        save(&mut state);

        state.session.dispatch(Action::Reset, Utc::now()).unwrap();
        assert!(state.session.history().is_empty());

        load(&mut state);
        assert_eq!(state.session.history().len(), 1);
        assert!(state.notices().iter().all(|n| n.level == NoticeLevel::Info));
    }

    #[test]
    fn test_load_missing_entry_offline() {
        let mut state = state(Some("nobody"));
        load(&mut state);
        assert_eq!(state.notices()[0].message, "No saved progress for nobody.");
    }

    #[test]
    fn test_load_corrupt_store_keeps_session() {
        let mut state = state(Some("alice"));
        state.session.dispatch(Action::Start, Utc::now()).unwrap();
        state.session.dispatch(Action::Select("2".into()), Utc::now()).unwrap();
        state.repository.put_value(PROGRESS_NAMESPACE, "[").unwrap();

        load(&mut state);
        assert_eq!(state.notices()[0].level, NoticeLevel::Error);
        assert_eq!(state.session.history().len(), 1);
    }

    #[test]
    fn test_report_offline_is_a_notice() {
        let mut state = state(None);
        report(&mut state, "secret".to_string());
        assert_eq!(state.notices()[0].level, NoticeLevel::Error);
        assert!(state.notices()[0].message.contains("QUIZ_BACKEND_URL"));
    }

    #[test]
    fn test_set_user() {
        let mut state = state(None);
        set_user(&mut state, "bob".to_string());
        assert_eq!(state.user_key.as_deref(), Some("bob"));
    }
}
