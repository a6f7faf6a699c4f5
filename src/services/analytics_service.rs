use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::auth::Identity;
use crate::models::question::{QuestionType, QuestionWithOptions};
use crate::models::quiz_response::{QuizResponse, QuizResponseWithAnswers};
use crate::services::attempt_service::AttemptService;
use crate::services::quiz_service::{ensure_owner, QuizService};

const RECENT_LIMIT: usize = 10;
const NO_ANSWER: &str = "No answer";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalytics {
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub total_responses: i64,
    pub correct_responses: i64,
    pub incorrect_responses: i64,
    pub accuracy_rate: f64,
    /// Submitted answer text to how often it was given.
    pub responses: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnalytics {
    pub quiz_id: Uuid,
    pub total_responses: i64,
    pub average_score: f64,
    pub highest_score: i32,
    pub lowest_score: i32,
    pub completion_rate: f64,
    pub question_analytics: Vec<QuestionAnalytics>,
    pub recent_responses: Vec<QuizResponse>,
}

impl QuizAnalytics {
    /// `responses` are expected newest first.
    pub fn compute(
        quiz_id: Uuid,
        questions: &[QuestionWithOptions],
        responses: &[QuizResponseWithAnswers],
    ) -> Self {
        let scores: Vec<i32> = responses.iter().map(|r| r.response.score).collect();
        let total_responses = responses.len() as i64;
        let average_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64
        };

        let completed = responses
            .iter()
            .filter(|r| {
                let answered = r
                    .question_responses
                    .iter()
                    .filter(|qr| qr.selected_answer.is_some())
                    .count();
                answered as i32 >= r.response.total_questions
            })
            .count();
        let completion_rate = if responses.is_empty() {
            0.0
        } else {
            completed as f64 / responses.len() as f64 * 100.0
        };

        let question_analytics = questions
            .iter()
            .map(|q| question_analytics(q, responses))
            .collect();

        Self {
            quiz_id,
            total_responses,
            average_score,
            highest_score: scores.iter().copied().max().unwrap_or(0),
            lowest_score: scores.iter().copied().min().unwrap_or(0),
            completion_rate,
            question_analytics,
            recent_responses: responses
                .iter()
                .take(RECENT_LIMIT)
                .map(|r| r.response.clone())
                .collect(),
        }
    }
}

fn question_analytics(
    question: &QuestionWithOptions,
    responses: &[QuizResponseWithAnswers],
) -> QuestionAnalytics {
    let mut total = 0i64;
    let mut correct = 0i64;
    let mut distribution: BTreeMap<String, i64> = BTreeMap::new();

    for qr in responses
        .iter()
        .flat_map(|r| r.question_responses.iter())
        .filter(|qr| qr.question_id == question.question.id)
    {
        total += 1;
        if qr.is_correct {
            correct += 1;
        }
        let key = qr
            .selected_answer
            .clone()
            .unwrap_or_else(|| NO_ANSWER.to_string());
        *distribution.entry(key).or_insert(0) += 1;
    }

    QuestionAnalytics {
        question_id: question.question.id,
        question_text: question.question.question_text.clone(),
        question_type: question.question.question_type,
        total_responses: total,
        correct_responses: correct,
        incorrect_responses: total - correct,
        accuracy_rate: if total > 0 {
            correct as f64 / total as f64 * 100.0
        } else {
            0.0
        },
        responses: distribution,
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    quizzes: QuizService,
    attempts: AttemptService,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            quizzes: QuizService::new(pool.clone()),
            attempts: AttemptService::new(pool),
        }
    }

    /// Owner-only.
    pub async fn quiz_analytics(&self, quiz_id: Uuid, identity: &Identity) -> Result<QuizAnalytics> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        ensure_owner(&quiz.quiz, identity)?;
        let responses = self.attempts.load_responses(quiz_id).await?;
        Ok(QuizAnalytics::compute(quiz_id, &quiz.questions, &responses))
    }
}
