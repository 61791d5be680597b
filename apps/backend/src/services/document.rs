//! The question document served to clients.

use std::io::ErrorKind;
use std::path::Path;

use quiz_core::{load_questions, question_type, derive_options, AnswerOption, QuestionEntry, QuestionType, QuizError};
use serde::Serialize;

/// A parsed entry with what a client needs to render it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    #[serde(flatten)]
    pub entry: QuestionEntry,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<AnswerOption>,
}

impl From<QuestionEntry> for QuestionView {
    fn from(entry: QuestionEntry) -> Self {
        let question_type = question_type(&entry);
        let options = derive_options(&entry, question_type);
        Self {
            entry,
            question_type,
            options,
        }
    }
}

/// Read the markdown document. `Ok(None)` when the file does not exist.
pub async fn read_document(path: &Path) -> std::io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(markdown) => Ok(Some(markdown)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Parse the document into renderable questions.
pub fn question_views(markdown: &str) -> Result<Vec<QuestionView>, QuizError> {
    Ok(load_questions(markdown)?.into_iter().map(QuestionView::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "## 第1章\n### 1-1\n<<<SPREAD_START>>>\n[LEFT]\n**正しいものはどれか**\n1. A\n2. B\n答え：２\n[/LEFT]\n[RIGHT]\n説明\n[/RIGHT]\n<<<SPREAD_END>>>\n";

    #[test]
    fn test_question_views_carry_type_and_options() {
        let views = question_views(DOC).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].question_type, QuestionType::Choice);
        assert_eq!(views[0].options.len(), 2);

        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["type"], "choice");
        assert_eq!(json["answerTokens"][0], "2");
        assert_eq!(json["chapter"], "第1章");
    }

    #[test]
    fn test_question_views_reject_documents_without_blocks() {
        assert!(matches!(question_views("# nothing"), Err(QuizError::NoQuestions)));
    }

    #[tokio::test]
    async fn test_read_missing_document() {
        let result = read_document(Path::new("/nonexistent/spread_all.md")).await.unwrap();
        assert!(result.is_none());
    }
}
