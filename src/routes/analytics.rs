use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::auth::Identity;
use crate::AppState;

pub async fn quiz_analytics(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    tracing::debug!(quiz_id = %id, "Computing quiz analytics");
    let analytics = state.analytics_service.quiz_analytics(id, &identity).await?;
    Ok(Json(analytics))
}
