use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::question::{QuestionType, QuestionWithOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub selected_answer: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    pub score: i32,
    pub total_questions: i32,
    pub answers: Vec<GradedAnswer>,
}

pub struct GradingService;

impl GradingService {
    /// Option questions match the correct option text exactly, case and
    /// whitespace included. Short answers only need non-blank text.
    pub fn is_correct(question: &QuestionWithOptions, submitted: Option<&str>) -> bool {
        let Some(submitted) = submitted else {
            return false;
        };
        match question.question.question_type {
            QuestionType::ShortAnswer => !submitted.trim().is_empty(),
            QuestionType::MultipleChoice | QuestionType::TrueFalse => question
                .correct_option()
                .map(|opt| opt.option_text == submitted)
                .unwrap_or(false),
        }
    }

    /// Every question has a non-null answer.
    pub fn is_complete(question_count: usize, answers: &[Option<String>]) -> bool {
        answers.len() == question_count && answers.iter().all(Option::is_some)
    }

    /// `answers` runs parallel to `questions`; a missing entry grades as unanswered.
    pub fn grade(questions: &[QuestionWithOptions], answers: &[Option<String>]) -> GradeReport {
        let mut score: i32 = 0;
        let mut graded = Vec::with_capacity(questions.len());

        for (idx, question) in questions.iter().enumerate() {
            let selected = answers.get(idx).cloned().flatten();
            let is_correct = Self::is_correct(question, selected.as_deref());
            if is_correct {
                score += 1;
            }
            graded.push(GradedAnswer {
                question_id: question.question.id,
                selected_answer: selected,
                is_correct,
            });
        }

        GradeReport {
            score,
            total_questions: questions.len() as i32,
            answers: graded,
        }
    }
}
