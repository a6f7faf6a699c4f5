pub mod ai_service;
pub mod analytics_service;
pub mod attempt_service;
pub mod grading_service;
pub mod quiz_service;
pub mod response_parser;
