use crate::error::{Error, Result};
use crate::models::generated_question::GeneratedQuestion;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Removes markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace(JSON_FENCE, "").replace(FENCE, "").trim().to_string()
}

/// Parses the model's text into questions. The whole batch is rejected if any
/// element has the wrong shape.
pub fn parse_generated_questions(raw: &str) -> Result<Vec<GeneratedQuestion>> {
    let cleaned = strip_code_fences(raw);

    let questions: Vec<GeneratedQuestion> = serde_json::from_str(&cleaned)
        .map_err(|e| Error::MalformedModelOutput(format!("invalid question JSON: {}", e)))?;

    for (idx, question) in questions.iter().enumerate() {
        question.check_shape().map_err(|e| {
            Error::MalformedModelOutput(format!("question {}: {}", idx + 1, e))
        })?;
    }

    Ok(questions)
}
