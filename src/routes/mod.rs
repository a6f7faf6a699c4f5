pub mod analytics;
pub mod attempt;
pub mod generation;
pub mod health;
pub mod quiz;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::auth::{optional_auth, require_auth};
use crate::AppState;

const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/generate-questions", post(generation::generate_questions))
        .route("/api/quizzes", get(quiz::list_published));

    let viewer_api = Router::new()
        .route("/api/quizzes/:id", get(quiz::get_quiz))
        .route("/api/quizzes/:id/responses", post(attempt::submit_responses))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let owner_api = Router::new()
        .route("/api/quizzes", post(quiz::create_quiz))
        .route("/api/quizzes/mine", get(quiz::list_mine))
        .route("/api/quizzes/:id", delete(quiz::delete_quiz))
        .route("/api/quizzes/:id/publish", patch(quiz::set_published))
        .route("/api/quizzes/:id/results", get(attempt::list_results))
        .route("/api/quizzes/:id/analytics", get(analytics::quiz_analytics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public_api
        .merge(viewer_api)
        .merge(owner_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}
