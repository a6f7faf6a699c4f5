use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Option<Uuid>,
    pub score: i32,
    pub total_questions: i32,
    pub completed_at: DateTime<Utc>,
}

impl QuizResponse {
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total_questions)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: Uuid,
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub selected_answer: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponseWithAnswers {
    #[serde(flatten)]
    pub response: QuizResponse,
    pub question_responses: Vec<QuestionResponse>,
}

pub fn percentage(score: i32, total: i32) -> f64 {
    if total > 0 {
        (score as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
