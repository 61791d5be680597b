//! Question type inference and answer evaluation.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parser::text::{canonical_ox, is_ox_glyph};
use crate::types::{AnswerOption, QuestionEntry, QuestionType, OX_FALSE, OX_TRUE};

static NUMBERED_OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[.\s、)]\s*(.+)$").unwrap());

/// Phrases that mark a question as "select all that apply".
const SELECT_ALL_PHRASES: [&str; 4] = ["すべて選", "全て選", "複数選択", "select all that apply"];

/// Smallest number of options offered when they are synthesized from numeric answers.
const MIN_SYNTHESIZED_OPTIONS: u32 = 4;

/// Verdict for a submitted selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_correct: bool,
    pub question_type: QuestionType,
    /// Selection after glyph normalization.
    pub selected: Vec<String>,
    /// Canonical answer tokens.
    pub expected: Vec<String>,
}

/// Classify a question from its answer tokens and text.
pub fn infer_question_type(tokens: &[String], text: &str) -> QuestionType {
    if !tokens.is_empty() && tokens.iter().all(|token| is_ox_glyph(token)) {
        return QuestionType::Ox;
    }
    if tokens.len() > 1 || mentions_select_all(text) {
        return QuestionType::Multi;
    }
    QuestionType::Choice
}

/// Question type of a parsed entry.
pub fn question_type(entry: &QuestionEntry) -> QuestionType {
    infer_question_type(&entry.answer_tokens, &entry.full_text())
}

fn mentions_select_all(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SELECT_ALL_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Whether `selection` answers `entry` correctly.
pub fn evaluate(entry: &QuestionEntry, selection: &[String]) -> bool {
    compare_selection(entry, selection).is_correct
}

/// Compare a selection with the entry's answer tokens.
///
/// `ox`/`choice` need exactly one selection equal to the first token; `multi`
/// compares sorted, deduplicated sets.
pub fn compare_selection(entry: &QuestionEntry, selection: &[String]) -> MatchResult {
    let question_type = question_type(entry);
    let selected: Vec<String> = selection.iter().map(|s| canonical_ox(s.trim())).collect();
    let expected: Vec<String> = entry.answer_tokens.iter().map(|t| canonical_ox(t)).collect();

    let is_correct = match expected.first() {
        None => false,
        Some(first) => {
            if question_type == QuestionType::Multi {
                let expected_set: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
                let selected_set: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
                selected_set == expected_set
            } else {
                selected.len() == 1 && &selected[0] == first
            }
        }
    };

    MatchResult {
        is_correct,
        question_type,
        selected,
        expected,
    }
}

/// Options to offer for an entry.
///
/// True/false questions get the two glyphs. Otherwise numbered lines of the
/// question body are used; if there are none and every answer token is a
/// number, options `1..=max(4, largest answer)` are synthesized.
pub fn derive_options(entry: &QuestionEntry, question_type: QuestionType) -> Vec<AnswerOption> {
    if question_type == QuestionType::Ox {
        return [OX_TRUE, OX_FALSE]
            .iter()
            .map(|glyph| AnswerOption {
                id: glyph.to_string(),
                label: glyph.to_string(),
            })
            .collect();
    }

    let numbered: Vec<AnswerOption> = entry
        .question_body
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let caps = NUMBERED_OPTION_RE.captures(line)?;
            Some(AnswerOption {
                id: caps.get(1)?.as_str().to_string(),
                label: caps.get(2)?.as_str().trim().to_string(),
            })
        })
        .collect();

    let options = if !numbered.is_empty() {
        numbered
    } else {
        synthesize_numeric_options(&entry.answer_tokens)
    };

    dedup_options(options)
}

fn synthesize_numeric_options(tokens: &[String]) -> Vec<AnswerOption> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let numbers: Option<Vec<u32>> = tokens.iter().map(|t| t.parse::<u32>().ok()).collect();
    let Some(numbers) = numbers else {
        return Vec::new();
    };

    let max = numbers.into_iter().fold(MIN_SYNTHESIZED_OPTIONS, u32::max);
    (1..=max)
        .map(|n| AnswerOption {
            id: n.to_string(),
            label: n.to_string(),
        })
        .collect()
}

fn dedup_options(options: Vec<AnswerOption>) -> Vec<AnswerOption> {
    let mut seen = BTreeSet::new();
    options
        .into_iter()
        .filter(|option| seen.insert(option.id.clone()))
        .collect()
}
