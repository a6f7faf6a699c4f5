use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::quiz_dto::{CreateQuizPayload, QuizView, SetPublishedPayload};
use crate::error::Result;
use crate::middleware::auth::Identity;
use crate::AppState;

pub async fn list_published(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let quizzes = state.quiz_service.list_published().await?;
    Ok(Json(quizzes))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    let quizzes = state.quiz_service.list_by_creator(&identity).await?;
    Ok(Json(quizzes))
}

#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateQuizPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let quiz = state.quiz_service.create_quiz(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(QuizView::new(quiz, true))))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let identity = identity.map(|Extension(i)| i);
    let quiz = state
        .quiz_service
        .get_visible_quiz(id, identity.as_ref())
        .await?;
    let is_owner = identity.is_some_and(|i| quiz.is_owned_by(i.user_id));
    Ok(Json(QuizView::new(quiz, is_owner)))
}

pub async fn set_published(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetPublishedPayload>,
) -> Result<impl IntoResponse> {
    let quiz = state
        .quiz_service
        .set_published(id, &identity, payload.is_published)
        .await?;
    Ok(Json(quiz))
}

pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.quiz_service.delete_quiz(id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
