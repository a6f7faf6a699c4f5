use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::generated_question::{GeneratedQuestion, GenerationRequest};
use crate::services::response_parser::parse_generated_questions;

pub const MISSING_API_KEY_MESSAGE: &str = "Gemini API key is not configured";

/// One text-in, text-out call to a generative model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Option<Self> {
        config.gemini_api_key.clone().map(|key| {
            Self::new(
                key,
                config.gemini_model.clone(),
                config.gemini_base_url.clone(),
                client,
            )
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API Error {}: {}", status, text).into());
        }

        let body: JsonValue = res.json().await?;
        Ok(extract_text(&body))
    }
}

/// Concatenates the text parts of the first candidate. Empty when there are none.
fn extract_text(body: &JsonValue) -> String {
    body.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub fn build_prompt(request: &GenerationRequest) -> String {
    let types = request
        .question_types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Generate {count} quiz questions about "{topic}" at {difficulty} difficulty level.

Instructions:
- Use these question types: {types}
- For multiple_choice questions: provide 4 options with exactly 1 correct answer
- For true_false questions: provide the statement as the question text and exactly two answers, "True" and "False", with exactly 1 marked correct
- For short_answer questions: provide the question and a single answer holding the expected answer, marked correct
- Make questions educational and engaging
- Ensure answers are factually accurate

Return only a JSON array where each question object has:
- text: string (the question)
- type: one of {types}
- answers: array of objects with {{"text": string, "isCorrect": boolean}}

Example format:
[
  {{
    "text": "What is the capital of France?",
    "type": "multiple_choice",
    "answers": [
      {{"text": "London", "isCorrect": false}},
      {{"text": "Paris", "isCorrect": true}},
      {{"text": "Berlin", "isCorrect": false}},
      {{"text": "Madrid", "isCorrect": false}}
    ]
  }}
]"#,
        count = request.question_count,
        topic = request.topic,
        difficulty = request.difficulty.as_str(),
        types = types,
    )
}

#[derive(Clone)]
pub struct AIService {
    model: Option<Arc<dyn GenerativeModel>>,
}

impl AIService {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { model }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.generation_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http_client = builder.build()?;
        let model = GeminiClient::from_config(config, http_client)
            .map(|c| Arc::new(c) as Arc<dyn GenerativeModel>);
        Ok(Self::new(model))
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Issues exactly one model call. Transport failures and empty replies
    /// collapse into `Error::Generation`; bad output is `MalformedModelOutput`.
    pub async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>> {
        let Some(model) = &self.model else {
            return Err(Error::Config(MISSING_API_KEY_MESSAGE.to_string()));
        };

        let prompt = build_prompt(request);
        tracing::info!(
            topic = %request.topic,
            count = request.question_count,
            difficulty = request.difficulty.as_str(),
            "Requesting question generation"
        );

        let raw = model
            .generate(&prompt)
            .await
            .map_err(|e| Error::Generation(format!("model call failed: {:?}", e)))?;

        if raw.trim().is_empty() {
            return Err(Error::Generation(
                "no response text received from the model".to_string(),
            ));
        }

        let mut questions = parse_generated_questions(&raw)?;
        check_against_request(&questions, request)?;
        if questions.len() > request.question_count as usize {
            tracing::warn!(
                returned = questions.len(),
                requested = request.question_count,
                "Model returned extra questions; truncating"
            );
            questions.truncate(request.question_count as usize);
        }

        tracing::info!(count = questions.len(), "Question generation finished");
        Ok(questions)
    }
}

/// The reply must be non-empty and only use the requested question types.
fn check_against_request(
    questions: &[GeneratedQuestion],
    request: &GenerationRequest,
) -> Result<()> {
    if questions.is_empty() {
        return Err(Error::MalformedModelOutput(
            "model returned no questions".to_string(),
        ));
    }
    if let Some((idx, q)) = questions
        .iter()
        .enumerate()
        .find(|(_, q)| !request.question_types.contains(&q.question_type))
    {
        return Err(Error::MalformedModelOutput(format!(
            "question {}: type {} was not requested",
            idx + 1,
            q.question_type
        )));
    }
    Ok(())
}
