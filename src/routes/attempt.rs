use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::SubmitResponsesPayload;
use crate::error::Result;
use crate::middleware::auth::Identity;
use crate::AppState;

#[axum::debug_handler]
pub async fn submit_responses(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitResponsesPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let identity = identity.map(|Extension(i)| i);
    let result = state
        .attempt_service
        .submit(id, identity.as_ref(), &payload.answers)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn list_results(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let attempts = state.attempt_service.list_attempts(id, &identity).await?;
    Ok(Json(attempts))
}
