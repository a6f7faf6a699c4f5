use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::quiz_dto::CreateQuizPayload;
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::question::{AnswerOption, Question, QuestionWithOptions, ValidatedQuestion};
use crate::models::quiz::{Quiz, QuizSummary, QuizWithQuestions};

const SUMMARY_SELECT: &str = r#"
    SELECT
        q.*,
        (SELECT COUNT(*) FROM questions qs WHERE qs.quiz_id = q.id) AS question_count,
        (SELECT COUNT(*) FROM quiz_responses r WHERE r.quiz_id = q.id) AS response_count
    FROM quizzes q
"#;

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validates every question before writing anything, then stores the quiz,
    /// its questions and options in one transaction.
    pub async fn create_quiz(
        &self,
        identity: &Identity,
        payload: CreateQuizPayload,
    ) -> Result<QuizWithQuestions> {
        let title = payload.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::BadRequest("Title cannot be empty".to_string()));
        }
        let description = payload
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let validated = validate_drafts(payload.questions)?;

        let mut tx = self.pool.begin().await?;

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (title, description, quiz_type, is_published, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&title)
        .bind(&description)
        .bind(payload.quiz_type)
        .bind(payload.is_published)
        .bind(identity.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(validated.len());
        for (idx, draft) in validated.iter().enumerate() {
            let question = sqlx::query_as::<_, Question>(
                r#"
                INSERT INTO questions (quiz_id, question_text, question_type, reference_answer, order_index)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(quiz.id)
            .bind(draft.text())
            .bind(draft.question_type())
            .bind(draft.reference_answer())
            .bind(idx as i32)
            .fetch_one(&mut *tx)
            .await?;

            let mut answer_options = Vec::with_capacity(draft.options().len());
            for (opt_idx, option) in draft.options().iter().enumerate() {
                let row = sqlx::query_as::<_, AnswerOption>(
                    r#"
                    INSERT INTO answer_options (question_id, option_text, is_correct, order_index)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(question.id)
                .bind(&option.text)
                .bind(option.is_correct)
                .bind(opt_idx as i32)
                .fetch_one(&mut *tx)
                .await?;
                answer_options.push(row);
            }

            questions.push(QuestionWithOptions {
                question,
                answer_options,
            });
        }

        tx.commit().await?;

        tracing::info!(
            quiz_id = %quiz.id,
            questions = questions.len(),
            "Quiz created"
        );

        Ok(QuizWithQuestions { quiz, questions })
    }

    pub async fn list_published(&self) -> Result<Vec<QuizSummary>> {
        let sql = format!(
            "{} WHERE q.is_published = TRUE ORDER BY q.created_at DESC",
            SUMMARY_SELECT
        );
        let rows = sqlx::query_as::<_, QuizSummary>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_creator(&self, identity: &Identity) -> Result<Vec<QuizSummary>> {
        let sql = format!(
            "{} WHERE q.created_by = $1 ORDER BY q.updated_at DESC",
            SUMMARY_SELECT
        );
        let rows = sqlx::query_as::<_, QuizSummary>(&sql)
            .bind(identity.user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_quiz_row(&self, quiz_id: Uuid) -> Result<Quiz> {
        sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))
    }

    /// Questions in `order_index` order, each with its options in order.
    pub async fn load_questions(&self, quiz_id: Uuid) -> Result<Vec<QuestionWithOptions>> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE quiz_id = $1 ORDER BY order_index ASC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let options = sqlx::query_as::<_, AnswerOption>(
            "SELECT * FROM answer_options WHERE question_id = ANY($1) ORDER BY order_index ASC",
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(attach_options(questions, options))
    }

    pub async fn get_quiz(&self, quiz_id: Uuid) -> Result<QuizWithQuestions> {
        let quiz = self.get_quiz_row(quiz_id).await?;
        let questions = self.load_questions(quiz_id).await?;
        Ok(QuizWithQuestions { quiz, questions })
    }

    /// Quiz visible to the caller: published, or owned by them.
    pub async fn get_visible_quiz(
        &self,
        quiz_id: Uuid,
        identity: Option<&Identity>,
    ) -> Result<QuizWithQuestions> {
        let quiz = self.get_quiz(quiz_id).await?;
        let is_owner = identity.is_some_and(|i| quiz.is_owned_by(i.user_id));
        if !quiz.quiz.is_published && !is_owner {
            return Err(Error::NotFound("Quiz not found".to_string()));
        }
        Ok(quiz)
    }

    pub async fn get_owned_quiz(&self, quiz_id: Uuid, identity: &Identity) -> Result<Quiz> {
        let quiz = self.get_quiz_row(quiz_id).await?;
        ensure_owner(&quiz, identity)?;
        Ok(quiz)
    }

    pub async fn set_published(
        &self,
        quiz_id: Uuid,
        identity: &Identity,
        is_published: bool,
    ) -> Result<Quiz> {
        self.get_owned_quiz(quiz_id, identity).await?;

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes
            SET is_published = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(is_published)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(quiz_id = %quiz_id, is_published, "Quiz publication changed");
        Ok(quiz)
    }

    /// Questions, options and responses go with it.
    pub async fn delete_quiz(&self, quiz_id: Uuid, identity: &Identity) -> Result<()> {
        self.get_owned_quiz(quiz_id, identity).await?;

        sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(quiz_id = %quiz_id, "Quiz deleted");
        Ok(())
    }
}

pub fn ensure_owner(quiz: &Quiz, identity: &Identity) -> Result<()> {
    if quiz.created_by != identity.user_id {
        return Err(Error::Forbidden("You do not own this quiz".to_string()));
    }
    Ok(())
}

fn validate_drafts(
    drafts: Vec<crate::dto::quiz_dto::QuestionDraft>,
) -> Result<Vec<ValidatedQuestion>> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(idx, draft)| {
            draft
                .validated()
                .map_err(|e| Error::BadRequest(format!("Question {}: {}", idx + 1, e)))
        })
        .collect()
}

fn attach_options(
    questions: Vec<Question>,
    options: Vec<AnswerOption>,
) -> Vec<QuestionWithOptions> {
    let mut by_question: HashMap<Uuid, Vec<AnswerOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    questions
        .into_iter()
        .map(|question| {
            let mut answer_options = by_question.remove(&question.id).unwrap_or_default();
            answer_options.sort_by_key(|o| o.order_index);
            QuestionWithOptions {
                question,
                answer_options,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::quiz_dto::QuestionDraft;
    use crate::models::question::{AnswerDraft, QuestionType};
    use crate::models::quiz::QuizType;
    use chrono::Utc;

    fn quiz_owned_by(user_id: Uuid) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            title: "Capitals".into(),
            description: None,
            quiz_type: QuizType::Mixed,
            is_published: false,
            created_by: user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn ensure_owner_rejects_other_users() {
        let owner = Identity { user_id: Uuid::new_v4() };
        let other = Identity { user_id: Uuid::new_v4() };
        let quiz = quiz_owned_by(owner.user_id);
        assert!(ensure_owner(&quiz, &owner).is_ok());
        assert!(matches!(ensure_owner(&quiz, &other), Err(Error::Forbidden(_))));
    }

    #[test]
    fn invalid_draft_is_reported_with_its_position() {
        let drafts = vec![
            QuestionDraft {
                text: "Fine".into(),
                question_type: QuestionType::ShortAnswer,
                answers: vec![],
            },
            QuestionDraft {
                text: "Two right answers".into(),
                question_type: QuestionType::MultipleChoice,
                answers: vec![
                    AnswerDraft { text: "A".into(), is_correct: true },
                    AnswerDraft { text: "B".into(), is_correct: true },
                ],
            },
        ];
        let err = validate_drafts(drafts).unwrap_err();
        assert!(matches!(err, Error::BadRequest(ref m) if m.starts_with("Question 2")));
    }

    #[test]
    fn options_are_grouped_under_their_questions_in_order() {
        let quiz_id = Uuid::new_v4();
        let q1 = Question {
            id: Uuid::new_v4(),
            quiz_id,
            question_text: "First".into(),
            question_type: QuestionType::TrueFalse,
            reference_answer: None,
            order_index: 0,
            created_at: Utc::now(),
        };
        let q2 = Question {
            id: Uuid::new_v4(),
            order_index: 1,
            question_text: "Second".into(),
            question_type: QuestionType::ShortAnswer,
            ..q1.clone()
        };
        let option = |question_id: Uuid, text: &str, order_index: i32| AnswerOption {
            id: Uuid::new_v4(),
            question_id,
            option_text: text.into(),
            is_correct: false,
            order_index,
        };

        let grouped = attach_options(
            vec![q1.clone(), q2.clone()],
            vec![option(q1.id, "False", 1), option(q1.id, "True", 0)],
        );

        assert_eq!(grouped.len(), 2);
        let texts: Vec<&str> = grouped[0]
            .answer_options
            .iter()
            .map(|o| o.option_text.as_str())
            .collect();
        assert_eq!(texts, vec!["True", "False"]);
        assert!(grouped[1].answer_options.is_empty());
    }
}
