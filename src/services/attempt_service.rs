use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::attempt_dto::{AttemptResult, QuestionResult, SubmitResponsesResult, SubmittedAnswer};
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::question::{QuestionType, QuestionWithOptions};
use crate::models::quiz_response::{QuestionResponse, QuizResponse, QuizResponseWithAnswers};
use crate::services::grading_service::{GradeReport, GradingService};
use crate::services::quiz_service::QuizService;

pub const INCOMPLETE_MESSAGE: &str = "All questions must be answered before submitting";

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
    quizzes: QuizService,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        let quizzes = QuizService::new(pool.clone());
        Self { pool, quizzes }
    }

    /// Grades and records one attempt. Nothing is written unless every
    /// question has an answer.
    pub async fn submit(
        &self,
        quiz_id: Uuid,
        identity: Option<&Identity>,
        answers: &[SubmittedAnswer],
    ) -> Result<SubmitResponsesResult> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        if !quiz.quiz.is_published {
            return Err(Error::NotFound("Quiz not found".to_string()));
        }

        let report = prepare_submission(&quiz.questions, answers)?;
        let user_id = identity.map(|i| i.user_id);

        let mut tx = self.pool.begin().await?;

        let response = sqlx::query_as::<_, QuizResponse>(
            r#"
            INSERT INTO quiz_responses (quiz_id, user_id, score, total_questions)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .bind(report.score)
        .bind(report.total_questions)
        .fetch_one(&mut *tx)
        .await?;

        for graded in &report.answers {
            sqlx::query(
                r#"
                INSERT INTO question_responses (response_id, question_id, selected_answer, is_correct)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(response.id)
            .bind(graded.question_id)
            .bind(&graded.selected_answer)
            .bind(graded.is_correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            quiz_id = %quiz_id,
            response_id = %response.id,
            score = response.score,
            total = response.total_questions,
            "Quiz attempt recorded"
        );

        Ok(SubmitResponsesResult {
            response_id: response.id,
            score: response.score,
            total_questions: response.total_questions,
            percentage: response.percentage(),
            completed_at: response.completed_at,
            results: report.answers,
        })
    }

    /// The caller's own attempts for a quiz, newest first. Still readable after
    /// the quiz is unpublished.
    pub async fn list_attempts(
        &self,
        quiz_id: Uuid,
        identity: &Identity,
    ) -> Result<Vec<AttemptResult>> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;

        let responses = sqlx::query_as::<_, QuizResponse>(
            r#"
            SELECT * FROM quiz_responses
            WHERE quiz_id = $1 AND user_id = $2
            ORDER BY completed_at DESC
            "#,
        )
        .bind(quiz_id)
        .bind(identity.user_id)
        .fetch_all(&self.pool)
        .await?;

        let responses = self.attach_answers(responses).await?;
        Ok(responses
            .into_iter()
            .map(|r| build_attempt_result(&quiz.questions, r))
            .collect())
    }

    /// Every attempt for a quiz, newest first.
    pub async fn load_responses(&self, quiz_id: Uuid) -> Result<Vec<QuizResponseWithAnswers>> {
        let responses = sqlx::query_as::<_, QuizResponse>(
            "SELECT * FROM quiz_responses WHERE quiz_id = $1 ORDER BY completed_at DESC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_answers(responses).await
    }

    async fn attach_answers(
        &self,
        responses: Vec<QuizResponse>,
    ) -> Result<Vec<QuizResponseWithAnswers>> {
        let ids: Vec<Uuid> = responses.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, QuestionResponse>(
            "SELECT * FROM question_responses WHERE response_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_response: HashMap<Uuid, Vec<QuestionResponse>> = HashMap::new();
        for row in rows {
            by_response.entry(row.response_id).or_default().push(row);
        }

        Ok(responses
            .into_iter()
            .map(|response| QuizResponseWithAnswers {
                question_responses: by_response.remove(&response.id).unwrap_or_default(),
                response,
            })
            .collect())
    }
}

/// Lines submitted answers up with the quiz's question order, applies the
/// completion gate, then grades.
pub fn prepare_submission(
    questions: &[QuestionWithOptions],
    submitted: &[SubmittedAnswer],
) -> Result<GradeReport> {
    if questions.is_empty() {
        return Err(Error::BadRequest("Quiz has no questions".to_string()));
    }

    let mut by_question: HashMap<Uuid, Option<String>> = HashMap::new();
    for answer in submitted {
        if !questions.iter().any(|q| q.question.id == answer.question_id) {
            return Err(Error::BadRequest(format!(
                "Answer references unknown question {}",
                answer.question_id
            )));
        }
        by_question.insert(answer.question_id, answer.selected_answer.clone());
    }

    let answers: Vec<Option<String>> = questions
        .iter()
        .map(|q| by_question.get(&q.question.id).cloned().flatten())
        .collect();

    if !GradingService::is_complete(questions.len(), &answers) {
        return Err(Error::BadRequest(INCOMPLETE_MESSAGE.to_string()));
    }

    Ok(GradingService::grade(questions, &answers))
}

pub fn build_attempt_result(
    questions: &[QuestionWithOptions],
    attempt: QuizResponseWithAnswers,
) -> AttemptResult {
    let by_question: HashMap<Uuid, &QuestionResponse> = attempt
        .question_responses
        .iter()
        .map(|qr| (qr.question_id, qr))
        .collect();

    let results = questions
        .iter()
        .map(|q| {
            let recorded = by_question.get(&q.question.id);
            let correct_answer = match q.question.question_type {
                QuestionType::ShortAnswer => q.question.reference_answer.clone(),
                _ => q.correct_option().map(|o| o.option_text.clone()),
            };
            QuestionResult {
                question_id: q.question.id,
                question_text: q.question.question_text.clone(),
                question_type: q.question.question_type,
                selected_answer: recorded.and_then(|r| r.selected_answer.clone()),
                is_correct: recorded.map(|r| r.is_correct).unwrap_or(false),
                correct_answer,
            }
        })
        .collect();

    AttemptResult {
        response_id: attempt.response.id,
        score: attempt.response.score,
        total_questions: attempt.response.total_questions,
        percentage: attempt.response.percentage(),
        completed_at: attempt.response.completed_at,
        questions: results,
    }
}
