//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};
use uuid::Uuid;

/// A two-chapter document with one single-question block and one
/// two-question block.
pub fn sample_document() -> String {
    [
        "# テスト問題集",
        "## 第1章 精油の基礎",
        "### 1-1",
        "<<<SPREAD_START>>>",
        "[LEFT]",
        "**精油の抽出法として正しいものはどれか**",
        "1. 水蒸気蒸留法",
        "2. 乾留法",
        "3. 燻蒸法",
        "答え：１",
        "[/LEFT]",
        "[RIGHT]",
        "水蒸気蒸留法が最も一般的です。",
        "[/RIGHT]",
        "[SOURCE]テキスト p.12[/SOURCE]",
        "<<<SPREAD_END>>>",
        "## 第2章 安全性",
        "### 2-1",
        "<<<SPREAD_START>>>",
        "[LEFT]",
        "**問題 1**",
        "柑橘系の精油には光毒性があるものがある",
        "**問題 2**",
        "精油は原液のまま肌に塗ってよい",
        "[/LEFT]",
        "[RIGHT]",
        "問題 1 【解答】 〇 【解説】 ベルガモットなどが該当します。",
        "問題 2 【解答】 ✕ 【解説】 希釈して使います。",
        "[/RIGHT]",
        "<<<SPREAD_END>>>",
        "",
    ]
    .join("\n")
}

/// Generate a unique learner key for test isolation.
pub fn unique_user_key(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, &Uuid::new_v4().to_string()[..8])
}

/// One answer as the client sends it.
pub fn answer(question_id: &str, selected: &[&str], is_correct: bool, answered_at: &str, chapter: &str) -> Value {
    json!({
        "questionId": question_id,
        "selected": selected,
        "isCorrect": is_correct,
        "answeredAt": answered_at,
        "chapter": chapter,
    })
}

/// POST /api/progress body.
pub fn save_progress_request(user_key: &str, answers: Vec<Value>, study_dates: &[&str]) -> Value {
    json!({
        "userKey": user_key,
        "answers": answers,
        "studyDates": study_dates,
    })
}
