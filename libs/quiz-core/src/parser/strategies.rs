//! Answer extraction strategies.
//!
//! Each strategy is a pure function over the LEFT and RIGHT page texts
//! (emphasis already removed). [`ANSWER_STRATEGIES`] lists them in priority
//! order and [`extract_answer`] returns the first hit.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{strip_emphasis, to_half_width};

static LEFT_ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"答え[:：]\s*([0-9０-９〇○×✕❌⭕、,\s]+)").unwrap());
static RIGHT_CORRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"正解[:：は]?\s*([0-9０-９〇○×✕❌⭕、,\s]+)").unwrap());
static RIGHT_RESPONSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"解答[:：]?\s*([0-9０-９〇○×✕❌⭕、,\s]+)").unwrap());

/// A named answer extractor.
#[derive(Clone, Copy)]
pub struct AnswerStrategy {
    pub name: &'static str,
    pub extract: fn(left: &str, right: &str) -> Option<String>,
}

/// Strategies in the order they are tried.
pub const ANSWER_STRATEGIES: [AnswerStrategy; 3] = [
    AnswerStrategy {
        name: "left_answer_label",
        extract: left_answer_label,
    },
    AnswerStrategy {
        name: "right_correct_label",
        extract: right_correct_label,
    },
    AnswerStrategy {
        name: "right_response_label",
        extract: right_response_label,
    },
];

/// `答え：1` on the left page.
pub fn left_answer_label(left: &str, _right: &str) -> Option<String> {
    capture_answer(&LEFT_ANSWER_RE, left)
}

/// `正解：1`, `正解は 1, 3` or `正解 2` on the right page.
pub fn right_correct_label(_left: &str, right: &str) -> Option<String> {
    capture_answer(&RIGHT_CORRECT_RE, right)
}

/// `解答 1` or `解答：〇` on the right page.
pub fn right_response_label(_left: &str, right: &str) -> Option<String> {
    capture_answer(&RIGHT_RESPONSE_RE, right)
}

/// Run the strategies in priority order. Empty string when none match.
pub fn extract_answer(left: &str, right: &str) -> String {
    let left = strip_emphasis(left);
    let right = strip_emphasis(right);

    ANSWER_STRATEGIES
        .iter()
        .find_map(|strategy| (strategy.extract)(&left, &right))
        .unwrap_or_default()
}

/// Answer of one `Q<n>` segment: `解答` first, then `正解`.
pub fn extract_segment_answer(segment: &str) -> Option<String> {
    capture_answer(&RIGHT_RESPONSE_RE, segment).or_else(|| capture_answer(&RIGHT_CORRECT_RE, segment))
}

fn capture_answer(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| to_half_width(m.as_str().trim()))
}
