//! Text normalization helpers shared by the parser stages.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{OX_FALSE, OX_TRUE};

static BR_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TOKEN_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,\s、，]+").unwrap());

/// Convert full-width digits (０-９) to ASCII digits.
pub fn to_half_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Unify line endings to `\n`.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Remove emphasis markers, convert `<br>` tags to newlines, drop inline code ticks and trim.
pub fn clean_markdown(text: &str) -> String {
    let text = normalize_newlines(text).replace("**", "");
    let text = BR_TAG_RE.replace_all(&text, "\n");
    text.replace('`', "").trim().to_string()
}

/// Remove emphasis markers only.
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}

/// First non-blank line, trimmed.
pub fn first_non_blank_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// True for every accepted true/false glyph variant.
pub fn is_ox_glyph(token: &str) -> bool {
    matches!(token, "〇" | "○" | "⭕" | "✕" | "×" | "❌")
}

/// Map a true/false glyph variant to its canonical form; other tokens are returned unchanged.
pub fn canonical_ox(token: &str) -> String {
    match token {
        "〇" | "○" | "⭕" => OX_TRUE.to_string(),
        "✕" | "×" | "❌" => OX_FALSE.to_string(),
        other => other.to_string(),
    }
}

/// Split a raw answer into comparison tokens.
pub fn tokenize_answer(answer: &str) -> Vec<String> {
    TOKEN_SPLIT_RE
        .split(&to_half_width(answer))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(canonical_ox)
        .collect()
}

/// Drop every line carrying an inline `答え：` label.
pub fn strip_answer_line(text: &str) -> String {
    text.lines()
        .filter(|line| !line.contains("答え："))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
