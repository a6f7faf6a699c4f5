use serde::{Deserialize, Serialize};

use super::question::{AnswerDraft, QuestionType, QuestionShapeError, ValidatedQuestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Parameters for one call to the generative model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_count: u32,
    pub question_types: Vec<QuestionType>,
}

/// A question suggested by the model, not yet part of any quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub answers: Vec<AnswerDraft>,
}

impl GeneratedQuestion {
    /// Generated questions must be gradable as returned.
    pub fn check_shape(&self) -> Result<(), QuestionShapeError> {
        let validated =
            ValidatedQuestion::new(self.text.clone(), self.question_type, self.answers.clone())?;
        validated.require_answer_key()
    }
}
