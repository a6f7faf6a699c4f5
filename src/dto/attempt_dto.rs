use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::QuestionType;
use crate::services::grading_service::GradedAnswer;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponsesPayload {
    #[validate(length(min = 1, message = "At least one answer is required"))]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponsesResult {
    pub response_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<GradedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub selected_answer: Option<String>,
    pub is_correct: bool,
    /// Correct option text, or the reference answer for short answers.
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub response_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub completed_at: DateTime<Utc>,
    pub questions: Vec<QuestionResult>,
}
