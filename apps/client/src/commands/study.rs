//! Quiz session commands.

use super::{Command, CommandError};
use crate::render;
use chrono::Utc;
use quiz_core::{Action, QuizSession};

fn actions(command: Command) -> Result<Vec<Action>, CommandError> {
    let actions = match command {
        Command::Start => vec![Action::Start],
        Command::Select(ids) => ids.into_iter().map(Action::Select).collect(),
        Command::Show => vec![Action::ToggleAnswer],
        Command::Next => vec![Action::Next],
        Command::Previous => vec![Action::Previous],
        Command::Jump(id) => vec![Action::Jump(id)],
        Command::Chapter(Some(name)) => vec![Action::SelectChapter(name)],
        Command::Incorrect(only) => vec![Action::SetOnlyIncorrect(only)],
        Command::Shuffle => vec![Action::Shuffle],
        Command::Finish => vec![Action::Finish],
        Command::Review => vec![Action::Review],
        Command::Reset => vec![Action::Reset],
        other => {
            return Err(CommandError {
                message: format!("{other:?} is not a quiz command"),
            })
        }
    };
    Ok(actions)
}

/// Dispatch the command's actions and render the resulting screen.
///
/// Several option ids are applied in order; the first rejected one stops the rest.
pub fn apply(session: &mut QuizSession, command: Command) -> Result<String, CommandError> {
    for action in actions(command)? {
        tracing::debug!(action = action.name(), "dispatch");
        session.dispatch(action, Utc::now())?;
    }
    Ok(render::screen(session))
}
