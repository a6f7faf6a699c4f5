use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::generated_question::{Difficulty, GeneratedQuestion, GenerationRequest};
use crate::models::question::QuestionType;

pub const MISSING_FIELDS_MESSAGE: &str = "Topic, question count, and question types are required";

/// Raw body of `POST /api/generate-questions`. Every field is optional here so
/// that missing fields produce the boundary's own 400 message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsPayload {
    pub topic: Option<String>,
    pub question_count: Option<u32>,
    pub question_types: Option<Vec<QuestionType>>,
    pub difficulty: Option<Difficulty>,
}

impl GenerateQuestionsPayload {
    pub fn into_request(self, max_questions: u32) -> Result<GenerationRequest> {
        let topic = self
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let question_count = self.question_count.filter(|c| *c > 0);
        let question_types = self.question_types.filter(|t| !t.is_empty());

        let (Some(topic), Some(question_count), Some(types)) =
            (topic, question_count, question_types)
        else {
            return Err(Error::BadRequest(MISSING_FIELDS_MESSAGE.to_string()));
        };

        if question_count > max_questions {
            return Err(Error::BadRequest(format!(
                "questionCount must not exceed {}",
                max_questions
            )));
        }

        let mut question_types: Vec<QuestionType> = Vec::with_capacity(types.len());
        for t in types {
            if !question_types.contains(&t) {
                question_types.push(t);
            }
        }

        Ok(GenerationRequest {
            topic,
            difficulty: self.difficulty.unwrap_or_default(),
            question_count,
            question_types,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<GeneratedQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> GenerateQuestionsPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn missing_topic_is_rejected_with_field_message() {
        let err = payload(serde_json::json!({
            "questionCount": 3,
            "questionTypes": ["multiple_choice"]
        }))
        .into_request(50)
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest(ref m) if m == MISSING_FIELDS_MESSAGE));
    }

    #[test]
    fn zero_count_and_empty_types_count_as_missing() {
        let zero = payload(serde_json::json!({
            "topic": "Rome", "questionCount": 0, "questionTypes": ["true_false"]
        }));
        assert!(matches!(zero.into_request(50), Err(Error::BadRequest(_))));

        let no_types = payload(serde_json::json!({
            "topic": "Rome", "questionCount": 2, "questionTypes": []
        }));
        assert!(matches!(no_types.into_request(50), Err(Error::BadRequest(_))));
    }

    #[test]
    fn difficulty_defaults_to_medium_and_types_are_deduplicated() {
        let req = payload(serde_json::json!({
            "topic": "  Rome ",
            "questionCount": 2,
            "questionTypes": ["true_false", "short_answer", "true_false"]
        }))
        .into_request(50)
        .unwrap();
        assert_eq!(req.topic, "Rome");
        assert_eq!(req.difficulty, Difficulty::Medium);
        assert_eq!(
            req.question_types,
            vec![QuestionType::TrueFalse, QuestionType::ShortAnswer]
        );
    }

    #[test]
    fn count_above_limit_is_rejected() {
        let err = payload(serde_json::json!({
            "topic": "Rome", "questionCount": 11, "questionTypes": ["true_false"]
        }))
        .into_request(10)
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest(ref m) if m.contains("10")));
    }
}
