//! Line commands typed at the quiz prompt.

pub mod document;
pub mod progress;
pub mod study;

use crate::render;
use crate::state::AppState;
use quiz_core::SessionError;

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Select(Vec<String>),
    Show,
    Next,
    Previous,
    Jump(String),
    Chapter(Option<String>),
    Incorrect(bool),
    Shuffle,
    Finish,
    Review,
    Reset,
    User(String),
    Save,
    Load,
    Stats,
    Report(String),
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        Self { message: e.to_string() }
    }
}

impl From<crate::db::DbError> for CommandError {
    fn from(e: crate::db::DbError) -> Self {
        Self { message: e.to_string() }
    }
}

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    Quit,
}

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    let Some((word, rest)) = split_first_word(line) else {
        return Ok(None);
    };

    let command = match word.to_lowercase().as_str() {
        "start" => Command::Start,
        "show" | "answer" => Command::Show,
        "next" | "n" => Command::Next,
        "prev" | "previous" | "p" => Command::Previous,
        "jump" => Command::Jump(required(rest, "jump <id>")?),
        "chapter" | "chapters" => Command::Chapter((!rest.is_empty()).then(|| rest.to_string())),
        "incorrect" => match rest.to_lowercase().as_str() {
            "on" => Command::Incorrect(true),
            "off" => Command::Incorrect(false),
            _ => return Err(CommandError::new("usage: incorrect on|off")),
        },
        "shuffle" => Command::Shuffle,
        "finish" => Command::Finish,
        "review" => Command::Review,
        "reset" => Command::Reset,
        "user" => Command::User(required(rest, "user <key>")?),
        "save" => Command::Save,
        "load" => Command::Load,
        "stats" => Command::Stats,
        "report" => Command::Report(required(rest, "report <token>")?),
        "dismiss" => Command::Dismiss,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Select(line.split_whitespace().map(str::to_string).collect()),
    };
    Ok(Some(command))
}

fn split_first_word(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => Some((word, rest.trim())),
        None => Some((line, "")),
    }
}

fn required(rest: &str, usage: &str) -> Result<String, CommandError> {
    if rest.is_empty() {
        Err(CommandError::new(format!("usage: {usage}")))
    } else {
        Ok(rest.to_string())
    }
}

/// Run a command against the state.
pub fn execute(state: &mut AppState, command: Command) -> Result<Outcome, CommandError> {
    let text = match command {
        Command::Quit => return Ok(Outcome::Quit),
        Command::Help => render::HELP.to_string(),
        Command::Dismiss => {
            let cleared = state.dismiss();
            format!("Dismissed {cleared} notice(s).")
        }
        Command::User(key) => progress::set_user(state, key),
        Command::Save => progress::save(state),
        Command::Load => progress::load(state),
        Command::Stats => progress::stats(state),
        Command::Report(token) => progress::report(state, token),
        Command::Chapter(None) => render::chapters(&state.session),
        other => study::apply(&mut state.session, other)?,
    };
    Ok(Outcome::Print(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse("start").unwrap(), Some(Command::Start));
        assert_eq!(parse("N").unwrap(), Some(Command::Next));
        assert_eq!(parse("prev").unwrap(), Some(Command::Previous));
        assert_eq!(parse("incorrect on").unwrap(), Some(Command::Incorrect(true)));
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_arguments_keep_the_rest_of_the_line() {
        assert_eq!(
            parse("chapter 第1章 総論").unwrap(),
            Some(Command::Chapter(Some("第1章 総論".to_string())))
        );
        assert_eq!(parse("chapter").unwrap(), Some(Command::Chapter(None)));
        assert_eq!(parse("jump 2-1-Q1").unwrap(), Some(Command::Jump("2-1-Q1".to_string())));
        assert_eq!(parse("user  alice ").unwrap(), Some(Command::User("alice".to_string())));
    }

    #[test]
    fn test_option_ids() {
        assert_eq!(
            parse("1 3").unwrap(),
            Some(Command::Select(vec!["1".to_string(), "3".to_string()]))
        );
        assert_eq!(parse("〇").unwrap(), Some(Command::Select(vec!["〇".to_string()])));
    }

    #[test]
    fn test_missing_arguments() {
        assert_eq!(parse("jump").unwrap_err().message, "usage: jump <id>");
        assert!(parse("user").is_err());
        assert!(parse("incorrect maybe").is_err());
        assert_eq!(parse("report").unwrap_err().message, "usage: report <token>");
    }

    #[test]
    fn test_report_token() {
        assert_eq!(parse("report s3cret").unwrap(), Some(Command::Report("s3cret".to_string())));
    }
}
