use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
        }
    }

    /// Graded by comparing against the option flagged correct.
    pub fn has_options(&self) -> bool {
        !matches!(self, QuestionType::ShortAnswer)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub reference_answer: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub option_text: String,
    pub is_correct: bool,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub answer_options: Vec<AnswerOption>,
}

impl QuestionWithOptions {
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.answer_options.iter().find(|o| o.is_correct)
    }
}

/// Answer as authored in a draft or returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDraft {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionShapeError {
    #[error("question text must not be empty")]
    EmptyText,
    #[error("answer option text must not be empty")]
    EmptyOption,
    #[error("multiple choice questions need at least 2 options, got {0}")]
    TooFewOptions(usize),
    #[error("only one option may be marked correct, got {0}")]
    MultipleCorrect(usize),
    #[error("true/false questions need exactly the options \"True\" and \"False\"")]
    TrueFalseOptions,
    #[error("short answer questions take at most one reference answer, got {0}")]
    ShortAnswerOptions(usize),
    #[error("no option is marked correct")]
    MissingCorrect,
}

pub const TRUE_TEXT: &str = "True";
pub const FALSE_TEXT: &str = "False";

/// A question whose option set satisfies the per-type invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    text: String,
    question_type: QuestionType,
    options: Vec<AnswerDraft>,
    reference_answer: Option<String>,
}

impl ValidatedQuestion {
    pub fn new(
        text: impl Into<String>,
        question_type: QuestionType,
        answers: Vec<AnswerDraft>,
    ) -> Result<Self, QuestionShapeError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionShapeError::EmptyText);
        }

        match question_type {
            QuestionType::MultipleChoice => {
                if answers.len() < 2 {
                    return Err(QuestionShapeError::TooFewOptions(answers.len()));
                }
                if answers.iter().any(|a| a.text.trim().is_empty()) {
                    return Err(QuestionShapeError::EmptyOption);
                }
            }
            QuestionType::TrueFalse => {
                let texts: Vec<&str> = answers.iter().map(|a| a.text.as_str()).collect();
                let valid = texts.len() == 2
                    && texts.contains(&TRUE_TEXT)
                    && texts.contains(&FALSE_TEXT);
                if !valid {
                    return Err(QuestionShapeError::TrueFalseOptions);
                }
            }
            QuestionType::ShortAnswer => {
                if answers.len() > 1 {
                    return Err(QuestionShapeError::ShortAnswerOptions(answers.len()));
                }
                let reference_answer = answers
                    .into_iter()
                    .next()
                    .map(|a| a.text.trim().to_string())
                    .filter(|t| !t.is_empty());
                return Ok(Self {
                    text,
                    question_type,
                    options: Vec::new(),
                    reference_answer,
                });
            }
        }

        let correct = answers.iter().filter(|a| a.is_correct).count();
        if correct > 1 {
            return Err(QuestionShapeError::MultipleCorrect(correct));
        }

        Ok(Self {
            text,
            question_type,
            options: answers,
            reference_answer: None,
        })
    }

    /// Option-graded questions must carry exactly one correct option.
    pub fn require_answer_key(&self) -> Result<(), QuestionShapeError> {
        if self.question_type.has_options() && !self.options.iter().any(|o| o.is_correct) {
            return Err(QuestionShapeError::MissingCorrect);
        }
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    pub fn options(&self) -> &[AnswerDraft] {
        &self.options
    }

    pub fn reference_answer(&self) -> Option<&str> {
        self.reference_answer.as_deref()
    }
}
