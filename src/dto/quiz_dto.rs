use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::generated_question::GeneratedQuestion;
use crate::models::question::{
    AnswerDraft, QuestionShapeError, QuestionType, QuestionWithOptions, ValidatedQuestion,
};
use crate::models::quiz::{QuizType, QuizWithQuestions};

/// Editable question. Generated questions share this shape, so merging them
/// into a draft is a plain append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionDraft {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub answers: Vec<AnswerDraft>,
}

impl QuestionDraft {
    pub fn validated(self) -> Result<ValidatedQuestion, QuestionShapeError> {
        ValidatedQuestion::new(self.text, self.question_type, self.answers)
    }
}

impl From<GeneratedQuestion> for QuestionDraft {
    fn from(q: GeneratedQuestion) -> Self {
        Self {
            text: q.text,
            question_type: q.question_type,
            answers: q.answers,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizPayload {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    pub description: Option<String>,
    pub quiz_type: QuizType,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "At least one question is required"),
        nested
    )]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPublishedPayload {
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: Uuid,
    pub option_text: String,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_answer: Option<String>,
    pub answer_options: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub quiz_type: QuizType,
    pub is_published: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub questions: Vec<QuestionView>,
}

impl QuizView {
    /// Answer keys are only included when `reveal_answers` is set.
    pub fn new(quiz: QuizWithQuestions, reveal_answers: bool) -> Self {
        let questions = quiz
            .questions
            .into_iter()
            .map(|q| QuestionView::new(q, reveal_answers))
            .collect();
        let quiz_row = quiz.quiz;
        Self {
            id: quiz_row.id,
            title: quiz_row.title,
            description: quiz_row.description,
            quiz_type: quiz_row.quiz_type,
            is_published: quiz_row.is_published,
            created_by: quiz_row.created_by,
            created_at: quiz_row.created_at,
            updated_at: quiz_row.updated_at,
            questions,
        }
    }
}

impl QuestionView {
    fn new(q: QuestionWithOptions, reveal_answers: bool) -> Self {
        Self {
            id: q.question.id,
            question_text: q.question.question_text,
            question_type: q.question.question_type,
            order_index: q.question.order_index,
            reference_answer: q.question.reference_answer.filter(|_| reveal_answers),
            answer_options: q
                .answer_options
                .into_iter()
                .map(|o| OptionView {
                    id: o.id,
                    option_text: o.option_text,
                    order_index: o.order_index,
                    is_correct: reveal_answers.then_some(o.is_correct),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerOption, Question};
    use crate::models::quiz::Quiz;

    fn quiz_fixture() -> QuizWithQuestions {
        let quiz_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();
        let now = Utc::now();
        QuizWithQuestions {
            quiz: Quiz {
                id: quiz_id,
                title: "Capitals".into(),
                description: None,
                quiz_type: QuizType::MultipleChoice,
                is_published: true,
                created_by: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            },
            questions: vec![QuestionWithOptions {
                question: Question {
                    id: question_id,
                    quiz_id,
                    question_text: "Capital of France?".into(),
                    question_type: QuestionType::MultipleChoice,
                    reference_answer: None,
                    order_index: 0,
                    created_at: now,
                },
                answer_options: vec![AnswerOption {
                    id: Uuid::new_v4(),
                    question_id,
                    option_text: "Paris".into(),
                    is_correct: true,
                    order_index: 0,
                }],
            }],
        }
    }

    #[test]
    fn quiz_without_questions_fails_validation() {
        let payload: CreateQuizPayload = serde_json::from_value(serde_json::json!({
            "title": "Empty",
            "quizType": "mixed",
            "isPublished": true
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("questions"));
    }

    #[test]
    fn hidden_view_omits_correctness() {
        let json = serde_json::to_value(QuizView::new(quiz_fixture(), false)).unwrap();
        let option = &json["questions"][0]["answerOptions"][0];
        assert_eq!(option["optionText"], "Paris");
        assert!(option.get("isCorrect").is_none());
    }

    #[test]
    fn owner_view_includes_correctness() {
        let json = serde_json::to_value(QuizView::new(quiz_fixture(), true)).unwrap();
        assert_eq!(json["questions"][0]["answerOptions"][0]["isCorrect"], true);
    }

    #[test]
    fn generated_question_converts_to_draft() {
        let generated = GeneratedQuestion {
            text: "Rome was founded in 753 BC".into(),
            question_type: QuestionType::TrueFalse,
            answers: vec![
                AnswerDraft { text: "True".into(), is_correct: true },
                AnswerDraft { text: "False".into(), is_correct: false },
            ],
        };
        let draft = QuestionDraft::from(generated.clone());
        assert_eq!(draft.text, generated.text);
        assert!(draft.validated().is_ok());
    }
}
