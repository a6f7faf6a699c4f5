use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value as JsonValue;

use crate::dto::generation_dto::{GenerateQuestionsPayload, GenerateQuestionsResponse};
use crate::error::{Error, Result};
use crate::AppState;

#[axum::debug_handler]
pub async fn generate_questions(
    State(state): State<AppState>,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = body.map_err(|e| Error::BadRequest(e.body_text()))?;
    let payload: GenerateQuestionsPayload = serde_json::from_value(body)
        .map_err(|e| Error::BadRequest(format!("Invalid request body: {}", e)))?;
    let request = payload.into_request(state.config.max_generated_questions)?;

    let questions = state.ai_service.generate_questions(&request).await?;

    Ok(Json(GenerateQuestionsResponse { questions }))
}
