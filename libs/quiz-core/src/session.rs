//! Quiz session state machine.
//!
//! A [`QuizSession`] owns the parsed entries and everything the learner does
//! with them. All changes go through [`QuizSession::dispatch`], which checks
//! the action against the current [`Phase`].

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::matching::{compare_selection, derive_options, question_type};
use crate::parser::text::canonical_ox;
use crate::progress::{ProgressSnapshot, CURRENT_VERSION};
use crate::stats::accuracy_percent;
use crate::types::{AnswerOption, AnswerRecord, QuestionEntry, QuestionType, ALL_CHAPTERS, UNCLASSIFIED_CHAPTER};

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Where the learner is in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Quiz,
    Result,
}

/// Everything a learner can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    /// Pick an option id. Replaces the selection for `ox`/`choice`, toggles it for `multi`.
    Select(String),
    ToggleAnswer,
    Next,
    Previous,
    Jump(String),
    SelectChapter(String),
    SetOnlyIncorrect(bool),
    Shuffle,
    Finish,
    Review,
    Reset,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Select(_) => "select",
            Self::ToggleAnswer => "toggle_answer",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Jump(_) => "jump",
            Self::SelectChapter(_) => "select_chapter",
            Self::SetOnlyIncorrect(_) => "set_only_incorrect",
            Self::Shuffle => "shuffle",
            Self::Finish => "finish",
            Self::Review => "review",
            Self::Reset => "reset",
        }
    }

    fn allowed_in(&self, phase: Phase) -> bool {
        match self {
            Self::Start => phase == Phase::Start,
            Self::Select(_)
            | Self::ToggleAnswer
            | Self::Next
            | Self::Previous
            | Self::Jump(_)
            | Self::Finish => phase == Phase::Quiz,
            Self::Shuffle => phase != Phase::Result,
            Self::Review => phase == Phase::Result,
            Self::SelectChapter(_) | Self::SetOnlyIncorrect(_) | Self::Reset => true,
        }
    }
}

/// Counters over the current filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub incorrect: usize,
    /// Rounded percentage of answered questions that were correct.
    pub accuracy: u32,
    /// Rounded percentage position of the cursor in the view.
    pub progress: u32,
}

/// State of one learner working through a question set.
#[derive(Debug, Clone)]
pub struct QuizSession {
    entries: Vec<QuestionEntry>,
    phase: Phase,
    selected_chapter: String,
    only_incorrect: bool,
    index: usize,
    selection: Vec<String>,
    show_answer: bool,
    history: Vec<AnswerRecord>,
    study_dates: BTreeSet<NaiveDate>,
    utc_offset: FixedOffset,
}

impl QuizSession {
    /// New session over `entries`; study days are counted in UTC.
    pub fn new(entries: Vec<QuestionEntry>) -> Self {
        Self::with_offset(entries, Utc.fix())
    }

    /// New session counting study days in the given UTC offset.
    pub fn with_offset(entries: Vec<QuestionEntry>, utc_offset: FixedOffset) -> Self {
        Self {
            entries,
            phase: Phase::Start,
            selected_chapter: ALL_CHAPTERS.to_string(),
            only_incorrect: false,
            index: 0,
            selection: Vec::new(),
            show_answer: false,
            history: Vec::new(),
            study_dates: BTreeSet::new(),
            utc_offset,
        }
    }

    /// Replace every entry with a new parse and start over.
    pub fn load_entries(&mut self, entries: Vec<QuestionEntry>) {
        self.entries = entries;
        self.history.clear();
        self.clear_cursor();
        self.phase = Phase::Start;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn entries(&self) -> &[QuestionEntry] {
        &self.entries
    }

    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn show_answer(&self) -> bool {
        self.show_answer
    }

    pub fn selected_chapter(&self) -> &str {
        &self.selected_chapter
    }

    pub fn only_incorrect(&self) -> bool {
        self.only_incorrect
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn study_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.study_dates.iter().copied()
    }

    /// `すべて` followed by each chapter in document order.
    pub fn chapters(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(ALL_CHAPTERS.to_string())
            .chain(
                self.entries
                    .iter()
                    .map(|entry| {
                        if entry.chapter.is_empty() {
                            UNCLASSIFIED_CHAPTER.to_string()
                        } else {
                            entry.chapter.clone()
                        }
                    })
                    .filter(|chapter| seen.insert(chapter.clone())),
            )
            .collect()
    }

    /// Entries in the selected chapter, limited to incorrect ones when that filter is on.
    pub fn view(&self) -> Vec<&QuestionEntry> {
        let incorrect: HashSet<&str> = self
            .history
            .iter()
            .filter(|record| !record.is_correct)
            .map(|record| record.question_id.as_str())
            .collect();

        self.entries
            .iter()
            .filter(|entry| self.selected_chapter == ALL_CHAPTERS || entry.chapter == self.selected_chapter)
            .filter(|entry| !self.only_incorrect || incorrect.contains(entry.id.as_str()))
            .collect()
    }

    pub fn current(&self) -> Option<&QuestionEntry> {
        self.view().get(self.index).copied()
    }

    pub fn current_type(&self) -> Option<QuestionType> {
        self.current().map(question_type)
    }

    pub fn current_options(&self) -> Vec<AnswerOption> {
        self.current()
            .map(|entry| derive_options(entry, question_type(entry)))
            .unwrap_or_default()
    }

    /// Latest record for a question.
    pub fn record_for(&self, question_id: &str) -> Option<&AnswerRecord> {
        self.history.iter().find(|record| record.question_id == question_id)
    }

    pub fn stats(&self) -> SessionStats {
        let view = self.view();
        let ids: HashSet<&str> = view.iter().map(|entry| entry.id.as_str()).collect();
        let answered: Vec<&AnswerRecord> = self
            .history
            .iter()
            .filter(|record| ids.contains(record.question_id.as_str()))
            .collect();
        let correct = answered.iter().filter(|record| record.is_correct).count();
        let progress = if view.is_empty() {
            0
        } else {
            accuracy_percent(self.index.min(view.len() - 1) + 1, view.len())
        };

        SessionStats {
            total: view.len(),
            answered: answered.len(),
            correct,
            incorrect: answered.len() - correct,
            accuracy: accuracy_percent(correct, answered.len()),
            progress,
        }
    }

    /// Calendar day of `at` in the session's offset.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }

    /// Consecutive study days ending `today`, or yesterday if today has none yet.
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let yesterday = today - Duration::days(1);
        let mut day = if self.study_dates.contains(&today) {
            today
        } else if self.study_dates.contains(&yesterday) {
            yesterday
        } else {
            return 0;
        };

        let mut streak = 0;
        while self.study_dates.contains(&day) {
            streak += 1;
            day -= Duration::days(1);
        }
        streak
    }

    /// Apply an action, shuffling with the thread-local generator.
    pub fn dispatch(&mut self, action: Action, at: DateTime<Utc>) -> Result<()> {
        self.dispatch_with_rng(action, at, &mut rand::thread_rng())
    }

    /// Apply an action using `rng` for [`Action::Shuffle`].
    pub fn dispatch_with_rng<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<()> {
        if !action.allowed_in(self.phase) {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: action.name(),
            });
        }

        match action {
            Action::Start => {
                if self.view().is_empty() {
                    return Err(SessionError::EmptyView);
                }
                self.clear_cursor();
                self.phase = Phase::Quiz;
            }
            Action::Select(option) => self.select(&option, at)?,
            Action::ToggleAnswer => self.show_answer = !self.show_answer,
            Action::Next => {
                let last = self.view().len().saturating_sub(1);
                self.move_to((self.index + 1).min(last));
            }
            Action::Previous => self.move_to(self.index.saturating_sub(1)),
            Action::Jump(id) => {
                let position = self
                    .view()
                    .iter()
                    .position(|entry| entry.id == id)
                    .ok_or(SessionError::UnknownQuestion(id))?;
                self.move_to(position);
            }
            Action::SelectChapter(chapter) => {
                self.selected_chapter = chapter;
                self.clear_cursor();
            }
            Action::SetOnlyIncorrect(only) => {
                self.only_incorrect = only;
                self.clear_cursor();
            }
            Action::Shuffle => self.shuffle(rng),
            Action::Finish => {
                self.phase = Phase::Result;
                self.selection.clear();
                self.show_answer = false;
            }
            Action::Review => {
                self.clear_cursor();
                self.phase = Phase::Quiz;
            }
            Action::Reset => {
                self.history.clear();
                self.clear_cursor();
                self.phase = Phase::Start;
            }
        }

        Ok(())
    }

    fn select(&mut self, option: &str, at: DateTime<Utc>) -> Result<()> {
        let entry = self.current().cloned().ok_or(SessionError::EmptyView)?;
        let qtype = question_type(&entry);
        let option = canonical_ox(option.trim());

        let options = derive_options(&entry, qtype);
        if !options.is_empty() && !options.iter().any(|candidate| candidate.id == option) {
            return Err(SessionError::UnknownOption(option));
        }

        if qtype == QuestionType::Multi {
            if let Some(position) = self.selection.iter().position(|selected| *selected == option) {
                self.selection.remove(position);
            } else {
                self.selection.push(option);
            }
        } else {
            self.selection = vec![option];
        }

        let verdict = compare_selection(&entry, &self.selection);
        self.history.retain(|record| record.question_id != entry.id);
        self.history.push(AnswerRecord {
            question_id: entry.id.clone(),
            selected: self.selection.clone(),
            is_correct: verdict.is_correct,
            answered_at: at,
            chapter: Some(entry.chapter.clone()),
            source: entry.source.clone(),
        });
        self.study_dates.insert(self.local_date(at));
        self.show_answer = true;

        // Answering correctly under the incorrect-only filter can drop the entry from the view.
        let len = self.view().len();
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
        Ok(())
    }

    /// Shuffle the filtered view to the front of the entry list and clear history.
    fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let view_ids: HashSet<String> = self.view().iter().map(|entry| entry.id.clone()).collect();
        if view_ids.is_empty() {
            return;
        }

        let (mut shuffled, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| view_ids.contains(&entry.id));
        shuffled.shuffle(rng);
        shuffled.extend(others);

        self.entries = shuffled;
        self.history.clear();
        self.clear_cursor();
    }

    fn move_to(&mut self, index: usize) {
        self.index = index;
        self.selection.clear();
        self.show_answer = false;
    }

    fn clear_cursor(&mut self) {
        self.move_to(0);
    }

    /// Persistable copy of the learner-visible state.
    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> ProgressSnapshot {
        ProgressSnapshot {
            version: CURRENT_VERSION,
            current_id: self.current().map(|entry| entry.id.clone()),
            history: self.history.clone(),
            selected_chapter: self.selected_chapter.clone(),
            only_incorrect: self.only_incorrect,
            study_dates: self.study_dates.iter().copied().collect(),
            saved_at: Some(saved_at),
        }
    }

    /// Load saved state. The cursor moves to `currentId` when it is in the filtered view.
    pub fn restore(&mut self, snapshot: ProgressSnapshot) {
        self.history = snapshot.history;
        self.selected_chapter = if snapshot.selected_chapter.is_empty() {
            ALL_CHAPTERS.to_string()
        } else {
            snapshot.selected_chapter
        };
        self.only_incorrect = snapshot.only_incorrect;
        self.study_dates = snapshot.study_dates.into_iter().collect();

        let position = snapshot
            .current_id
            .and_then(|id| self.view().iter().position(|entry| entry.id == id));
        self.move_to(position.unwrap_or(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(id: &str, chapter: &str, answer: &[&str]) -> QuestionEntry {
        QuestionEntry {
            id: id.to_string(),
            statement: format!("{id} の問題"),
            answer: answer.join(","),
            answer_tokens: answer.iter().map(|t| t.to_string()).collect(),
            raw_left: String::new(),
            question_body: "1. A\n2. B\n3. C\n4. D".to_string(),
            explanation: String::new(),
            chapter: chapter.to_string(),
            source: None,
        }
    }

    fn sample() -> Vec<QuestionEntry> {
        vec![
            entry("1-1", "第1章", &["2"]),
            entry("1-2", "第1章", &["1", "3"]),
            entry("2-1", "第2章", &["〇"]),
        ]
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn started() -> QuizSession {
        let mut session = QuizSession::new(sample());
        session.dispatch(Action::Start, at(1)).unwrap();
        session
    }

    #[test]
    fn start_moves_to_quiz() {
        let session = started();
        assert_eq!(session.phase(), Phase::Quiz);
        assert_eq!(session.current().unwrap().id, "1-1");
    }

    #[test]
    fn start_with_empty_view_fails() {
        let mut session = QuizSession::new(Vec::new());
        assert_eq!(session.dispatch(Action::Start, at(1)), Err(SessionError::EmptyView));
        assert_eq!(session.phase(), Phase::Start);
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let mut session = QuizSession::new(sample());
        let err = session.dispatch(Action::Next, at(1)).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                phase: Phase::Start,
                action: "next"
            }
        );
    }

    #[test]
    fn choice_select_records_answer() {
        let mut session = started();
        session.dispatch(Action::Select("2".into()), at(1)).unwrap();

        assert!(session.show_answer());
        let record = session.record_for("1-1").unwrap();
        assert!(record.is_correct);
        assert_eq!(record.chapter.as_deref(), Some("第1章"));

        session.dispatch(Action::Select("1".into()), at(1)).unwrap();
        assert_eq!(session.history().len(), 1);
        assert!(!session.record_for("1-1").unwrap().is_correct);
    }

    #[test]
    fn multi_select_toggles() {
        let mut session = started();
        session.dispatch(Action::Next, at(1)).unwrap();
        session.dispatch(Action::Select("3".into()), at(1)).unwrap();
        session.dispatch(Action::Select("1".into()), at(1)).unwrap();
        assert!(session.record_for("1-2").unwrap().is_correct);

        session.dispatch(Action::Select("3".into()), at(1)).unwrap();
        assert_eq!(session.selection(), ["1".to_string()]);
        assert!(!session.record_for("1-2").unwrap().is_correct);
    }

    #[test]
    fn ox_select_accepts_glyph_variant() {
        let mut session = started();
        session.dispatch(Action::Jump("2-1".into()), at(1)).unwrap();
        session.dispatch(Action::Select("○".into()), at(1)).unwrap();
        assert!(session.record_for("2-1").unwrap().is_correct);
    }

    #[test]
    fn ox_with_two_glyphs_is_answerable() {
        let mut session = QuizSession::new(vec![entry("3-1", "第3章", &["〇", "✕"])]);
        session.dispatch(Action::Start, at(1)).unwrap();
        assert_eq!(session.current_type(), Some(QuestionType::Ox));

        session.dispatch(Action::Select("✕".into()), at(1)).unwrap();
        assert!(!session.record_for("3-1").unwrap().is_correct);

        session.dispatch(Action::Select("〇".into()), at(1)).unwrap();
        assert_eq!(session.selection(), &["〇".to_string()]);
        assert!(session.record_for("3-1").unwrap().is_correct);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut session = started();
        let err = session.dispatch(Action::Select("9".into()), at(1)).unwrap_err();
        assert_eq!(err, SessionError::UnknownOption("9".into()));
        assert!(session.history().is_empty());
    }

    #[test]
    fn navigation_is_clamped() {
        let mut session = started();
        session.dispatch(Action::Previous, at(1)).unwrap();
        assert_eq!(session.index(), 0);
        for _ in 0..5 {
            session.dispatch(Action::Next, at(1)).unwrap();
        }
        assert_eq!(session.index(), 2);
    }

    #[test]
    fn next_clears_selection() {
        let mut session = started();
        session.dispatch(Action::Select("2".into()), at(1)).unwrap();
        session.dispatch(Action::Next, at(1)).unwrap();
        assert!(session.selection().is_empty());
        assert!(!session.show_answer());
    }

    #[test]
    fn jump_to_unknown_id_fails() {
        let mut session = started();
        assert_eq!(
            session.dispatch(Action::Jump("nope".into()), at(1)),
            Err(SessionError::UnknownQuestion("nope".into()))
        );
    }

    #[test]
    fn chapter_filter_limits_view() {
        let mut session = started();
        session.dispatch(Action::SelectChapter("第2章".into()), at(1)).unwrap();
        let ids: Vec<_> = session.view().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2-1"]);
        assert_eq!(session.chapters(), vec!["すべて", "第1章", "第2章"]);
    }

    #[test]
    fn only_incorrect_filter() {
        let mut session = started();
        session.dispatch(Action::Select("1".into()), at(1)).unwrap();
        session.dispatch(Action::SetOnlyIncorrect(true), at(1)).unwrap();

        let ids: Vec<_> = session.view().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1-1"]);

        session.dispatch(Action::Select("2".into()), at(1)).unwrap();
        assert!(session.view().is_empty());
        assert!(session.current().is_none());
    }

    #[test]
    fn shuffle_moves_view_to_front_and_clears_history() {
        let mut session = started();
        session.dispatch(Action::Select("2".into()), at(1)).unwrap();
        session.dispatch(Action::SelectChapter("第2章".into()), at(1)).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        session.dispatch_with_rng(Action::Shuffle, at(1), &mut rng).unwrap();

        assert_eq!(session.entries()[0].id, "2-1");
        assert_eq!(session.entries().len(), 3);
        assert!(session.history().is_empty());
    }

    #[test]
    fn shuffle_keeps_every_entry() {
        let mut session = started();
        let mut rng = StdRng::seed_from_u64(42);
        session.dispatch_with_rng(Action::Shuffle, at(1), &mut rng).unwrap();

        let mut ids: Vec<_> = session.entries().iter().map(|e| e.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1-1", "1-2", "2-1"]);
    }

    #[test]
    fn finish_review_reset_cycle() {
        let mut session = started();
        session.dispatch(Action::Select("2".into()), at(1)).unwrap();
        session.dispatch(Action::Next, at(1)).unwrap();
        session.dispatch(Action::Finish, at(1)).unwrap();
        assert_eq!(session.phase(), Phase::Result);
        assert!(session.dispatch(Action::Shuffle, at(1)).is_err());

        session.dispatch(Action::Review, at(1)).unwrap();
        assert_eq!(session.phase(), Phase::Quiz);
        assert_eq!(session.index(), 0);
        assert_eq!(session.history().len(), 1);

        session.dispatch(Action::Reset, at(1)).unwrap();
        assert_eq!(session.phase(), Phase::Start);
        assert!(session.history().is_empty());
        assert_eq!(session.entries().len(), 3);
    }

    #[test]
    fn stats_over_view() {
        let mut session = started();
        session.dispatch(Action::Select("2".into()), at(1)).unwrap();
        session.dispatch(Action::Next, at(1)).unwrap();
        session.dispatch(Action::Select("1".into()), at(1)).unwrap();

        let stats = session.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.answered, 2);
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.incorrect, 1);
        assert_eq!(stats.accuracy, 50);
        assert_eq!(stats.progress, 67);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let mut session = started();
        for day in [1, 2, 3, 5] {
            session.dispatch(Action::Select("2".into()), at(day)).unwrap();
        }

        let date = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        assert_eq!(session.current_streak(date(3)), 3);
        assert_eq!(session.current_streak(date(4)), 3);
        assert_eq!(session.current_streak(date(5)), 1);
        assert_eq!(session.current_streak(date(8)), 0);
    }

    #[test]
    fn study_date_uses_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let mut session = QuizSession::with_offset(sample(), tokyo);
        session.dispatch(Action::Start, at(1)).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
        session.dispatch(Action::Select("2".into()), late).unwrap();

        assert_eq!(
            session.study_dates().collect::<Vec<_>>(),
            vec![NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()]
        );
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let mut session = started();
        session.dispatch(Action::Select("1".into()), at(1)).unwrap();
        session.dispatch(Action::Next, at(1)).unwrap();
        let snapshot = session.snapshot(at(1));
        assert_eq!(snapshot.current_id.as_deref(), Some("1-2"));

        let mut restored = QuizSession::new(sample());
        restored.restore(snapshot);
        assert_eq!(restored.current().unwrap().id, "1-2");
        assert_eq!(restored.history(), session.history());
        assert_eq!(restored.study_dates().count(), 1);
    }

    #[test]
    fn restore_with_missing_current_id_starts_at_zero() {
        let mut session = started();
        session.dispatch(Action::Next, at(1)).unwrap();
        session.restore(ProgressSnapshot {
            current_id: Some("gone".into()),
            ..Default::default()
        });
        assert_eq!(session.index(), 0);
    }

    #[test]
    fn load_entries_resets_session() {
        let mut session = started();
        session.dispatch(Action::Select("2".into()), at(1)).unwrap();
        session.load_entries(vec![entry("9-1", "第9章", &["1"])]);

        assert_eq!(session.phase(), Phase::Start);
        assert!(session.history().is_empty());
        assert_eq!(session.entries().len(), 1);
    }
}
