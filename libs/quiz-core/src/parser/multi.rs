//! Expansion of spread blocks that hold several questions.
//!
//! Two conventions exist in the source documents:
//! - the left page carries `**問題 1**`, `**問題 2**`, ... markers and the
//!   right page answers each with `【解答】` / `【解説】`;
//! - the right page is split into `Q1`, `Q2`, ... segments, each with its own
//!   `解答` / `正解` and `解説：` text.
//!
//! The left-page convention is checked first.

use std::sync::LazyLock;

use regex::Regex;

use super::strategies::extract_segment_answer;
use super::text::{clean_markdown, to_half_width, tokenize_answer};
use crate::types::QuestionEntry;

static LEFT_QUESTION_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*問題\s*\d+\*\*").unwrap());
static NEXT_QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"問題\s*\d+").unwrap());
static RIGHT_SEGMENT_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^Q\d+").unwrap());
static SEGMENT_EXPLANATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"解説[:：]").unwrap());

/// Block-level values shared by every sub-question.
pub(super) struct BlockContext<'a> {
    pub id: &'a str,
    pub chapter: &'a str,
    pub source: Option<&'a str>,
    pub statement: &'a str,
    pub answer: &'a str,
    pub raw_left: &'a str,
}

impl BlockContext<'_> {
    fn entry(
        &self,
        number: usize,
        statement: String,
        answer: String,
        raw_left: String,
        question_body: String,
        explanation: String,
    ) -> QuestionEntry {
        QuestionEntry {
            id: format!("{}-Q{}", self.id, number),
            statement,
            answer_tokens: tokenize_answer(&answer),
            answer,
            raw_left,
            question_body,
            explanation,
            chapter: self.chapter.to_string(),
            source: self.source.map(str::to_string),
        }
    }
}

/// Split on `**問題 N**` markers in the raw left page. `None` unless there are at least two.
pub(super) fn expand_left_questions(
    left: &str,
    right: &str,
    ctx: &BlockContext<'_>,
) -> Option<Vec<QuestionEntry>> {
    let marker_count = LEFT_QUESTION_MARKER_RE.find_iter(left).count();
    if marker_count < 2 {
        return None;
    }

    let right_clean = clean_markdown(right);
    let segments: Vec<&str> = LEFT_QUESTION_MARKER_RE.split(left).skip(1).collect();

    let entries = (1..=marker_count)
        .map(|number| {
            let segment = clean_markdown(segments.get(number - 1).copied().unwrap_or_default());
            let mut lines = segment.lines().map(str::trim).filter(|line| !line.is_empty());
            let statement = lines.next().unwrap_or_default().to_string();
            let options = lines.collect::<Vec<_>>().join("\n");
            let question_body = if options.is_empty() {
                statement.clone()
            } else {
                options
            };

            let answer = numbered_answer(&right_clean, number).unwrap_or_default();
            let explanation = numbered_explanation(&right_clean, number).unwrap_or_default();

            ctx.entry(number, statement, answer, segment, question_body, explanation)
        })
        .collect();

    Some(entries)
}

/// Split the cleaned right page on `Q<n>` line markers. `None` unless there are at least two.
pub(super) fn expand_right_segments(
    explanation: &str,
    ctx: &BlockContext<'_>,
) -> Option<Vec<QuestionEntry>> {
    if RIGHT_SEGMENT_MARKER_RE.find_iter(explanation).count() < 2 {
        return None;
    }

    let entries = RIGHT_SEGMENT_MARKER_RE
        .split(explanation)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(idx, segment)| {
            let answer = extract_segment_answer(segment).unwrap_or_else(|| ctx.answer.to_string());
            let statement = segment
                .lines()
                .find(|line| !line.trim().is_empty() && !line.contains("解答"))
                .map(|line| line.trim().to_string())
                .unwrap_or_else(|| ctx.statement.to_string());
            let explanation = SEGMENT_EXPLANATION_RE
                .split(segment)
                .nth(1)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(segment)
                .to_string();

            ctx.entry(
                idx + 1,
                statement.clone(),
                answer,
                ctx.raw_left.to_string(),
                statement,
                explanation,
            )
        })
        .collect();

    Some(entries)
}

/// `問題 n ... 【解答】 3` in the right page.
fn numbered_answer(right: &str, number: usize) -> Option<String> {
    let re = Regex::new(&format!(r"問題\s*{number}(?s:.*?)【解答】\s*([0-9０-９〇○×✕❌⭕.．]+)")).ok()?;
    let raw = re.captures(right)?.get(1)?.as_str();
    Some(to_half_width(raw.replace(['.', '．'], "").trim()))
}

/// `問題 n ... 【解説】 text` up to the next `問題 <digits>` or the end.
fn numbered_explanation(right: &str, number: usize) -> Option<String> {
    let re = Regex::new(&format!(r"問題\s*{number}(?s:.*?)【解説】")).ok()?;
    let start = re.find(right)?.end();
    let rest = &right[start..];
    let end = NEXT_QUESTION_RE.find(rest).map_or(rest.len(), |m| m.start());
    Some(rest[..end].trim().to_string())
}
