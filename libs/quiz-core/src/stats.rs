//! Per-learner aggregation for the instructor report.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Chapter used when an answer row carries none.
pub const FALLBACK_CHAPTER: &str = "その他";

/// A registered learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerRow {
    pub user_key: String,
    pub created_at: DateTime<Utc>,
}

/// One stored answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRow {
    pub user_key: String,
    pub question_id: String,
    pub is_correct: bool,
    pub chapter: Option<String>,
    pub answered_at: DateTime<Utc>,
}

/// One recorded study day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyDayRow {
    pub user_key: String,
    pub study_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterStats {
    pub correct: usize,
    pub total: usize,
    /// Sorted by question id.
    pub questions: Vec<QuestionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongQuestion {
    pub question_id: String,
    pub wrong_count: usize,
    pub chapter: String,
}

/// Everything the instructor sees about one learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerSummary {
    pub user_key: String,
    pub created_at: DateTime<Utc>,
    pub total_answers: usize,
    pub correct_answers: usize,
    pub accuracy: u32,
    pub study_days_count: usize,
    pub latest_activity: DateTime<Utc>,
    pub chapter_stats: BTreeMap<String, ChapterStats>,
    /// Most wrong answers first.
    pub wrong_questions: Vec<WrongQuestion>,
}

/// Rounded percentage of `part` in `whole`; 0 when `whole` is 0.
pub fn accuracy_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// Summarize every learner, keeping the order of `learners`.
pub fn aggregate(learners: &[LearnerRow], answers: &[AnswerRow], study_days: &[StudyDayRow]) -> Vec<LearnerSummary> {
    let mut answers_by_user: HashMap<&str, Vec<&AnswerRow>> = HashMap::new();
    for answer in answers {
        answers_by_user.entry(answer.user_key.as_str()).or_default().push(answer);
    }

    let mut days_by_user: HashMap<&str, usize> = HashMap::new();
    for day in study_days {
        *days_by_user.entry(day.user_key.as_str()).or_default() += 1;
    }

    learners
        .iter()
        .map(|learner| {
            let answers = answers_by_user
                .get(learner.user_key.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let study_days_count = days_by_user.get(learner.user_key.as_str()).copied().unwrap_or(0);
            summarize(learner, answers, study_days_count)
        })
        .collect()
}

fn summarize(learner: &LearnerRow, answers: &[&AnswerRow], study_days_count: usize) -> LearnerSummary {
    let total_answers = answers.len();
    let correct_answers = answers.iter().filter(|a| a.is_correct).count();
    let latest_activity = answers
        .iter()
        .map(|a| a.answered_at)
        .max()
        .unwrap_or(learner.created_at);

    LearnerSummary {
        user_key: learner.user_key.clone(),
        created_at: learner.created_at,
        total_answers,
        correct_answers,
        accuracy: accuracy_percent(correct_answers, total_answers),
        study_days_count,
        latest_activity,
        chapter_stats: chapter_stats(answers),
        wrong_questions: wrong_questions(answers),
    }
}

fn chapter_name(answer: &AnswerRow) -> String {
    answer
        .chapter
        .as_deref()
        .filter(|chapter| !chapter.is_empty())
        .unwrap_or(FALLBACK_CHAPTER)
        .to_string()
}

fn chapter_stats(answers: &[&AnswerRow]) -> BTreeMap<String, ChapterStats> {
    let mut stats: BTreeMap<String, ChapterStats> = BTreeMap::new();
    for answer in answers {
        let chapter = stats.entry(chapter_name(answer)).or_default();
        chapter.total += 1;
        if answer.is_correct {
            chapter.correct += 1;
        }
        chapter.questions.push(QuestionResult {
            question_id: answer.question_id.clone(),
            is_correct: answer.is_correct,
        });
    }

    for chapter in stats.values_mut() {
        chapter.questions.sort_by(|a, b| a.question_id.cmp(&b.question_id));
    }
    stats
}

fn wrong_questions(answers: &[&AnswerRow]) -> Vec<WrongQuestion> {
    let mut wrong: Vec<WrongQuestion> = Vec::new();
    for answer in answers.iter().filter(|a| !a.is_correct) {
        match wrong.iter_mut().find(|w| w.question_id == answer.question_id) {
            Some(existing) => existing.wrong_count += 1,
            None => wrong.push(WrongQuestion {
                question_id: answer.question_id.clone(),
                wrong_count: 1,
                chapter: chapter_name(answer),
            }),
        }
    }

    // Stable: ties keep first-seen order.
    wrong.sort_by(|a, b| b.wrong_count.cmp(&a.wrong_count));
    wrong
}
