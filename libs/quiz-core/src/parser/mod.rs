//! Spread document parser.
//!
//! # Format
//! ```markdown
//! ## 第1章
//! ### Q1
//! <<<SPREAD_START>>>
//! [LEFT]
//! **エッセンシャルオイルの抽出法は？**
//! 1. 水蒸気蒸留法
//! 2. 圧搾法
//! 答え：1
//! [/LEFT]
//! [RIGHT]
//! 正解：1
//! 水蒸気蒸留法が最も一般的。
//! [/RIGHT]
//! [SOURCE]テキスト p.12[/SOURCE]
//! <<<SPREAD_END>>>
//! ```
//!
//! `##` headings are chapters, each `###` heading followed by a
//! `<<<SPREAD_START>>>` ... `<<<SPREAD_END>>>` region is one block. A block
//! that matches the outer pattern always produces at least one entry; a
//! missing `[LEFT]`, `[RIGHT]` or `[SOURCE]` region degrades to an empty
//! string.

mod multi;
pub mod strategies;
pub mod text;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{QuizError, Result};
use crate::types::{ChapterMarker, QuestionEntry, UNCLASSIFIED_CHAPTER};
use multi::{expand_left_questions, expand_right_segments, BlockContext};
use strategies::extract_answer;
use text::{clean_markdown, first_non_blank_line, normalize_newlines, strip_answer_line, tokenize_answer};

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\n)##\s+([^\n]+)").unwrap());
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"###\s+([^\n]+)\n<<<SPREAD_START>>>\s*((?s:.*?))<<<SPREAD_END>>>").unwrap()
});
static LEFT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[LEFT\]\s*((?s:.*?))\s*\[/LEFT\]").unwrap());
static RIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[RIGHT\]\s*((?s:.*?))\s*\[/RIGHT\]").unwrap());
static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[SOURCE\]((?s:.*?))\[/SOURCE\]").unwrap());
static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static INLINE_ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"答え：.*").unwrap());

/// One `###` block as matched by the outer pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadBlock<'a> {
    pub id: &'a str,
    pub body: &'a str,
    pub offset: usize,
}

/// The tagged regions of a block, uncleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRegions<'a> {
    pub left: &'a str,
    pub right: &'a str,
    pub source: Option<&'a str>,
}

/// Parse a spread document into question entries, in document order.
///
/// Never fails: an unmatched document yields an empty list.
pub fn parse(markdown: &str) -> Vec<QuestionEntry> {
    let normalized = normalize_newlines(markdown);
    let chapters = find_chapters(&normalized);

    find_blocks(&normalized)
        .into_iter()
        .flat_map(|block| parse_block(&block, &chapters))
        .collect()
}

/// Like [`parse`], but an empty result is an error the caller shows to the user.
pub fn load_questions(markdown: &str) -> Result<Vec<QuestionEntry>> {
    if markdown.trim().is_empty() {
        return Err(QuizError::EmptyDocument);
    }

    let entries = parse(markdown);
    if entries.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    Ok(entries)
}

/// Every `##` heading with its offset, in document order.
pub fn find_chapters(markdown: &str) -> Vec<ChapterMarker> {
    CHAPTER_RE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(1)?;
            Some(ChapterMarker {
                offset: whole.start(),
                title: title.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// Every spread block with its offset, in document order.
pub fn find_blocks(markdown: &str) -> Vec<SpreadBlock<'_>> {
    BLOCK_RE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(SpreadBlock {
                id: caps.get(1)?.as_str().trim(),
                body: caps.get(2)?.as_str(),
                offset: whole.start(),
            })
        })
        .collect()
}

/// Locate the `[LEFT]`, `[RIGHT]` and `[SOURCE]` regions of a block body.
pub fn split_regions(body: &str) -> BlockRegions<'_> {
    BlockRegions {
        left: capture_region(&LEFT_RE, body).unwrap_or_default(),
        right: capture_region(&RIGHT_RE, body).unwrap_or_default(),
        source: capture_region(&SOURCE_RE, body),
    }
}

fn capture_region<'a>(re: &Regex, body: &'a str) -> Option<&'a str> {
    re.captures(body).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Title of the last chapter starting before `offset`.
pub fn chapter_for(chapters: &[ChapterMarker], offset: usize) -> &str {
    chapters
        .iter()
        .rev()
        .find(|chapter| chapter.offset < offset)
        .map_or(UNCLASSIFIED_CHAPTER, |chapter| chapter.title.as_str())
}

/// First emphasized span without a trailing `答え：` fragment, else the first non-blank line.
pub fn extract_statement(left: &str) -> String {
    if let Some(span) = EMPHASIS_RE.captures(left).and_then(|caps| caps.get(1)) {
        return INLINE_ANSWER_RE.replace(span.as_str(), "").trim().to_string();
    }

    first_non_blank_line(left).unwrap_or_default().to_string()
}

fn parse_block(block: &SpreadBlock<'_>, chapters: &[ChapterMarker]) -> Vec<QuestionEntry> {
    let regions = split_regions(block.body);

    let raw_left = clean_markdown(regions.left);
    let explanation = clean_markdown(regions.right);
    let statement = extract_statement(regions.left);
    let answer = extract_answer(regions.left, regions.right);
    let question_body = strip_answer_line(&raw_left);
    let chapter = chapter_for(chapters, block.offset);
    let source = regions.source.map(clean_markdown);

    let ctx = BlockContext {
        id: block.id,
        chapter,
        source: source.as_deref(),
        statement: &statement,
        answer: &answer,
        raw_left: &raw_left,
    };

    if let Some(entries) = expand_left_questions(regions.left, regions.right, &ctx) {
        return entries;
    }
    if let Some(entries) = expand_right_segments(&explanation, &ctx) {
        return entries;
    }

    vec![QuestionEntry {
        id: block.id.to_string(),
        statement,
        answer_tokens: tokenize_answer(&answer),
        answer,
        raw_left,
        question_body,
        explanation,
        chapter: chapter.to_string(),
        source,
    }]
}
