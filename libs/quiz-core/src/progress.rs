//! Persisted learner progress.
//!
//! A [`ProgressSnapshot`] is what the client stores per user key. Snapshots
//! are versioned: records written before versioning (no `version` field) are
//! migrated on read. A [`ProgressBook`] maps user keys to snapshots and is
//! stored as a single entry under [`PROGRESS_NAMESPACE`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProgressError;
use crate::types::{AnswerRecord, ALL_CHAPTERS};

/// Key under which the whole progress book is stored.
pub const PROGRESS_NAMESPACE: &str = "spread-quiz-progress";

/// Version written by this crate.
pub const CURRENT_VERSION: u32 = 2;

/// Version assumed for records without a `version` field.
const LEGACY_VERSION: u64 = 1;

const EPOCH: &str = "1970-01-01T00:00:00Z";

/// Saved session state for one learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_id: Option<String>,
    pub history: Vec<AnswerRecord>,
    pub selected_chapter: String,
    pub only_incorrect: bool,
    pub study_dates: Vec<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            current_id: None,
            history: Vec::new(),
            selected_chapter: ALL_CHAPTERS.to_string(),
            only_incorrect: false,
            study_dates: Vec::new(),
            saved_at: None,
        }
    }
}

impl ProgressSnapshot {
    /// Read a snapshot of any known version, migrating older shapes.
    pub fn from_value(value: Value) -> Result<Self, ProgressError> {
        let Value::Object(mut map) = value else {
            return Err(ProgressError::NotAnObject);
        };

        let version = match map.get("version") {
            None => LEGACY_VERSION,
            // Non-numeric versions fall through and fail deserialization.
            Some(v) => v.as_u64().unwrap_or(u64::from(CURRENT_VERSION)),
        };

        if version > u64::from(CURRENT_VERSION) {
            return Err(ProgressError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }
        if version <= LEGACY_VERSION {
            migrate_legacy(&mut map);
        }

        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

/// Rewrite a legacy record in place into the current shape.
///
/// Legacy history items are `{id, isCorrect, selected}` without a timestamp;
/// they get `questionId` and an `answeredAt` taken from `savedAt` (or the
/// Unix epoch).
fn migrate_legacy(map: &mut Map<String, Value>) {
    let answered_at = map
        .get("savedAt")
        .and_then(Value::as_str)
        .unwrap_or(EPOCH)
        .to_string();

    if let Some(Value::Array(history)) = map.get_mut("history") {
        for item in history.iter_mut().filter_map(Value::as_object_mut) {
            if !item.contains_key("questionId") {
                if let Some(id) = item.remove("id") {
                    item.insert("questionId".to_string(), id);
                }
            }
            item.entry("answeredAt")
                .or_insert_with(|| Value::String(answered_at.clone()));
            item.entry("selected").or_insert_with(|| Value::Array(Vec::new()));
        }
    }

    map.insert("version".to_string(), Value::from(CURRENT_VERSION));
}

/// Every learner's snapshot, keyed by user key.
///
/// Entries that cannot be read (malformed, or written by a newer version) are
/// kept as raw JSON so they neither block other learners nor get lost on the
/// next write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressBook {
    entries: BTreeMap<String, ProgressSnapshot>,
    unreadable: BTreeMap<String, Value>,
}

impl ProgressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored book, migrating each entry on its own.
    ///
    /// Fails only when the whole document is not a JSON object.
    pub fn from_json(raw: &str) -> Result<Self, ProgressError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(map) = value else {
            return Err(ProgressError::NotAnObject);
        };

        let mut book = Self::new();
        for (key, value) in map {
            match ProgressSnapshot::from_value(value.clone()) {
                Ok(snapshot) => {
                    book.entries.insert(key, snapshot);
                }
                Err(_) => {
                    book.unreadable.insert(key, value);
                }
            }
        }
        Ok(book)
    }

    /// Serialize readable and unreadable entries alike.
    pub fn to_json(&self) -> Result<String, ProgressError> {
        let mut map = Map::new();
        for (key, value) in &self.unreadable {
            map.insert(key.clone(), value.clone());
        }
        for (key, snapshot) in &self.entries {
            map.insert(key.clone(), serde_json::to_value(snapshot)?);
        }
        Ok(serde_json::to_string(&Value::Object(map))?)
    }

    pub fn get(&self, user_key: &str) -> Option<&ProgressSnapshot> {
        self.entries.get(user_key)
    }

    /// The learner's snapshot, or the reason their stored entry cannot be read.
    pub fn read(&self, user_key: &str) -> Result<Option<ProgressSnapshot>, ProgressError> {
        if let Some(raw) = self.unreadable.get(user_key) {
            return ProgressSnapshot::from_value(raw.clone()).map(Some);
        }
        Ok(self.entries.get(user_key).cloned())
    }

    /// Store a snapshot, replacing any previous one for the key.
    pub fn insert(&mut self, user_key: impl Into<String>, snapshot: ProgressSnapshot) {
        let user_key = user_key.into();
        self.unreadable.remove(&user_key);
        self.entries.insert(user_key, snapshot);
    }

    pub fn remove(&mut self, user_key: &str) -> Option<ProgressSnapshot> {
        self.unreadable.remove(user_key);
        self.entries.remove(user_key)
    }

    /// Number of stored learners, readable or not.
    pub fn len(&self) -> usize {
        self.entries.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unreadable.is_empty()
    }

    pub fn user_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn unreadable_keys(&self) -> impl Iterator<Item = &str> {
        self.unreadable.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn legacy_record_is_migrated() {
        let legacy = json!({
            "currentId": "1-1",
            "history": [{"id": "1-1", "isCorrect": true, "selected": ["2"]}],
            "selectedChapter": "第1章",
            "onlyIncorrect": true,
            "savedAt": "2024-05-01T10:00:00Z"
        });

        let snapshot = ProgressSnapshot::from_value(legacy).unwrap();

        assert_eq!(snapshot.version, CURRENT_VERSION);
        assert_eq!(snapshot.current_id.as_deref(), Some("1-1"));
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].question_id, "1-1");
        assert_eq!(
            snapshot.history[0].answered_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
        assert!(snapshot.study_dates.is_empty());
        assert!(snapshot.only_incorrect);
    }

    #[test]
    fn legacy_without_saved_at_uses_epoch() {
        let legacy = json!({"history": [{"id": "A", "isCorrect": false, "selected": []}]});
        let snapshot = ProgressSnapshot::from_value(legacy).unwrap();
        assert_eq!(snapshot.history[0].answered_at, Utc.timestamp_opt(0, 0).unwrap());
        assert_eq!(snapshot.selected_chapter, ALL_CHAPTERS);
    }

    #[test]
    fn current_version_round_trips() {
        let mut snapshot = ProgressSnapshot {
            current_id: Some("X".to_string()),
            study_dates: vec![NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()],
            ..Default::default()
        };
        snapshot.history.push(AnswerRecord {
            question_id: "X".to_string(),
            selected: vec!["1".to_string()],
            is_correct: true,
            answered_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            chapter: Some("第1章".to_string()),
            source: None,
        });

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["studyDates"], json!(["2024-05-01"]));
        assert_eq!(ProgressSnapshot::from_value(value).unwrap(), snapshot);
    }

    #[test]
    fn newer_version_is_rejected() {
        let err = ProgressSnapshot::from_value(json!({"version": 9})).unwrap_err();
        assert!(matches!(
            err,
            ProgressError::UnsupportedVersion { found: 9, supported: CURRENT_VERSION }
        ));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            ProgressSnapshot::from_value(json!([1, 2])),
            Err(ProgressError::NotAnObject)
        ));
    }

    #[test]
    fn book_insert_is_last_write_wins() {
        let mut book = ProgressBook::new();
        book.insert("alice", ProgressSnapshot::default());
        book.insert(
            "alice",
            ProgressSnapshot {
                only_incorrect: true,
                ..Default::default()
            },
        );

        assert_eq!(book.len(), 1);
        assert!(book.get("alice").unwrap().only_incorrect);
    }

    #[test]
    fn book_from_json_migrates_each_entry() {
        let raw = r#"{
            "alice": {"history": [{"id": "Q", "isCorrect": true, "selected": ["1"]}]},
            "bob": {"version": 2, "onlyIncorrect": true}
        }"#;

        let book = ProgressBook::from_json(raw).unwrap();

        assert_eq!(book.user_keys().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(book.get("alice").unwrap().history[0].question_id, "Q");
        assert!(book.get("bob").unwrap().only_incorrect);

        let reparsed = ProgressBook::from_json(&book.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, book);
    }

    #[test]
    fn book_keeps_unreadable_entries_aside() {
        let raw = r#"{"alice": {"version": 9}, "carol": {"history": "oops"}, "bob": {"version": 2}}"#;

        let mut book = ProgressBook::from_json(raw).unwrap();
        assert_eq!(book.user_keys().collect::<Vec<_>>(), vec!["bob"]);
        assert_eq!(book.unreadable_keys().collect::<Vec<_>>(), vec!["alice", "carol"]);
        assert!(matches!(
            book.read("alice"),
            Err(ProgressError::UnsupportedVersion { found: 9, .. })
        ));
        assert!(book.read("bob").unwrap().is_some());
        assert_eq!(book.read("dave").unwrap(), None);

        book.insert("dave", ProgressSnapshot::default());
        let written: Value = serde_json::from_str(&book.to_json().unwrap()).unwrap();
        assert_eq!(written["alice"], json!({"version": 9}));
        assert_eq!(written["carol"], json!({"history": "oops"}));
        assert_eq!(written["dave"]["version"], json!(CURRENT_VERSION));
    }

    #[test]
    fn insert_replaces_unreadable_entry() {
        let mut book = ProgressBook::from_json(r#"{"alice": {"version": 9}}"#).unwrap();
        book.insert("alice", ProgressSnapshot::default());

        assert_eq!(book.len(), 1);
        assert!(book.unreadable_keys().next().is_none());
        assert!(book.read("alice").unwrap().is_some());
    }

    #[test]
    fn book_rejects_malformed_json() {
        assert!(matches!(ProgressBook::from_json("{"), Err(ProgressError::Malformed(_))));
        assert!(matches!(ProgressBook::from_json("[]"), Err(ProgressError::NotAnObject)));
    }
}
