//! Plain-text rendering of the session for the terminal.

use crate::state::{Notice, NoticeLevel};
use chrono::NaiveDate;
use quiz_core::{LearnerSummary, Phase, QuestionEntry, QuestionType, QuizSession};
use std::fmt::Write;

pub const HELP: &str = "\
Commands:
  start                 begin the quiz
  <id> [<id>...]        select option ids (multi questions toggle)
  show                  show or hide the answer
  next | n, prev | p    move through the questions
  jump <id>             go to a question by id
  chapter [<name>]      filter by chapter, or list chapters
  incorrect on|off      only questions answered incorrectly
  shuffle               shuffle the current questions
  finish, review        see results, go back through the questions
  reset                 clear answers and return to the start
  user <key>            set the learner key
  save, load            store or restore progress for the learner
  stats                 session statistics and study streak
  report <token>        instructor report for every learner
  dismiss               clear notices
  help, quit";

/// The screen for the session's current phase.
pub fn screen(session: &QuizSession) -> String {
    match session.phase() {
        Phase::Start => start_screen(session),
        Phase::Quiz => question_screen(session),
        Phase::Result => result_screen(session),
    }
}

fn filter_line(session: &QuizSession) -> String {
    format!(
        "chapter: {}, only incorrect: {}",
        session.selected_chapter(),
        if session.only_incorrect() { "on" } else { "off" }
    )
}

fn start_screen(session: &QuizSession) -> String {
    let count = session.view().len();
    if count == 0 {
        return format!("No questions match the filter ({}).", filter_line(session));
    }
    format!(
        "{count} questions ({}). Type `start` to begin.",
        filter_line(session)
    )
}

fn question_screen(session: &QuizSession) -> String {
    let Some(entry) = session.current() else {
        return format!("No questions match the filter ({}).", filter_line(session));
    };
    let stats = session.stats();
    let mut out = String::new();

    let question_type = session.current_type().unwrap_or(QuestionType::Choice);
    let source = entry
        .source
        .as_deref()
        .map(|source| format!(" ({source})"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "[{}/{}] {}{source}  {}  ({}, {}%)",
        session.index() + 1,
        stats.total,
        entry.id,
        entry.chapter,
        question_type.as_str(),
        stats.progress
    );
    let _ = writeln!(out, "{}", entry.statement);
    for line in body_lines(entry, question_type) {
        let _ = writeln!(out, "{line}");
    }

    for option in session.current_options() {
        let mark = if session.selection().contains(&option.id) { '*' } else { ' ' };
        let _ = writeln!(out, " {mark} {}. {}", option.id, option.label);
    }

    if session.show_answer() {
        let verdict = match session.record_for(&entry.id) {
            Some(record) if record.is_correct => "Correct",
            Some(_) => "Incorrect",
            None => "Not answered",
        };
        let _ = writeln!(out, "{verdict}. Answer: {}", entry.answer);
        if !entry.explanation.is_empty() {
            let _ = writeln!(out, "{}", entry.explanation);
        }
    }

    out.trim_end().to_string()
}

/// Question body lines not already shown as the statement or as options.
fn body_lines(entry: &QuestionEntry, question_type: QuestionType) -> Vec<&str> {
    if entry.question_body.trim() == entry.statement.trim() {
        return Vec::new();
    }
    entry
        .question_body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != entry.statement)
        .filter(|line| question_type == QuestionType::Ox || !is_numbered_option(line))
        .collect()
}

/// `1. label`, `2) label`, `3、label` and the like.
fn is_numbered_option(line: &str) -> bool {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.len() < line.len() && rest.starts_with(['.', ' ', '、', ')'])
}

fn result_screen(session: &QuizSession) -> String {
    let stats = session.stats();
    let mut out = format!(
        "Finished: {}/{} correct ({}%), {} of {} answered.",
        stats.correct, stats.answered, stats.accuracy, stats.answered, stats.total
    );

    let missed: Vec<&str> = session
        .view()
        .iter()
        .filter(|entry| session.record_for(&entry.id).is_some_and(|r| !r.is_correct))
        .map(|entry| entry.id.as_str())
        .collect();
    if !missed.is_empty() {
        let _ = write!(out, "\nIncorrect: {}", missed.join(", "));
    }
    out.push_str("\nType `review` to go back or `reset` to start over.");
    out
}

pub fn stats(session: &QuizSession, today: NaiveDate) -> String {
    let stats = session.stats();
    format!(
        "Questions: {}  Answered: {}  Correct: {}  Incorrect: {}\nAccuracy: {}%  Progress: {}%\nStudy days: {}  Streak: {}",
        stats.total,
        stats.answered,
        stats.correct,
        stats.incorrect,
        stats.accuracy,
        stats.progress,
        session.study_dates().count(),
        session.current_streak(today)
    )
}

pub fn chapters(session: &QuizSession) -> String {
    session
        .chapters()
        .iter()
        .map(|name| {
            let mark = if name == session.selected_chapter() { '*' } else { ' ' };
            format!(" {mark} {name}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Instructor view: one block per learner with chapter totals and missed questions.
pub fn report(users: &[LearnerSummary]) -> String {
    if users.is_empty() {
        return "Instructor report: no learners yet.".to_string();
    }

    let mut out = format!("Instructor report: {} learner(s)", users.len());
    for user in users {
        let _ = write!(
            out,
            "\n\n{}  answers: {}  correct: {}  accuracy: {}%  study days: {}  latest: {}",
            user.user_key,
            user.total_answers,
            user.correct_answers,
            user.accuracy,
            user.study_days_count,
            user.latest_activity.format("%Y-%m-%d %H:%M")
        );
        for (chapter, stats) in &user.chapter_stats {
            let _ = write!(out, "\n  {chapter}: {}/{}", stats.correct, stats.total);
        }
        if !user.wrong_questions.is_empty() {
            let missed: Vec<String> = user
                .wrong_questions
                .iter()
                .map(|wrong| format!("{} x{}", wrong.question_id, wrong.wrong_count))
                .collect();
            let _ = write!(out, "\n  missed: {}", missed.join(", "));
        }
    }
    out
}

pub fn notices(notices: &[Notice]) -> Option<String> {
    if notices.is_empty() {
        return None;
    }
    let lines: Vec<String> = notices
        .iter()
        .map(|notice| match notice.level {
            NoticeLevel::Info => format!("[info] {}", notice.message),
            NoticeLevel::Error => format!("[error] {}", notice.message),
        })
        .collect();
    Some(format!("{}\n(type `dismiss` to clear)", lines.join("\n")))
}
