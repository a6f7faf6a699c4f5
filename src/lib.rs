pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    ai_service::AIService, analytics_service::AnalyticsService, attempt_service::AttemptService,
    quiz_service::QuizService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ai_service: AIService,
    pub quiz_service: QuizService,
    pub attempt_service: AttemptService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self> {
        let ai_service = AIService::from_config(&config)?;
        if !ai_service.is_configured() {
            tracing::warn!("GEMINI_API_KEY is not set; question generation will fail");
        }

        Ok(Self {
            quiz_service: QuizService::new(pool.clone()),
            attempt_service: AttemptService::new(pool.clone()),
            ai_service,
            analytics_service: AnalyticsService::new(pool),
            config: Arc::new(config),
        })
    }

    /// Swaps the generation backend, e.g. for a stub model.
    pub fn with_ai_service(mut self, ai_service: AIService) -> Self {
        self.ai_service = ai_service;
        self
    }
}
