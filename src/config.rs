use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub max_generated_questions: u32,
    pub generation_timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            gemini_api_key: get_env_opt("GEMINI_API_KEY"),
            gemini_model: get_env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: get_env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            max_generated_questions: match get_env_opt("MAX_GENERATED_QUESTIONS") {
                Some(_) => get_env_parse("MAX_GENERATED_QUESTIONS")?,
                None => 50,
            },
            generation_timeout_secs: match get_env_opt("GENERATION_TIMEOUT_SECS") {
                Some(_) => Some(get_env_parse("GENERATION_TIMEOUT_SECS")?),
                None => None,
            },
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

/// Unset and blank values both count as absent.
fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_name_the_variable() {
        env::set_var("QUIZ_TEST_BAD_NUMBER", "many");
        let err = get_env_parse::<u32>("QUIZ_TEST_BAD_NUMBER").unwrap_err();
        assert!(err.to_string().contains("QUIZ_TEST_BAD_NUMBER"));
    }

    #[test]
    fn blank_optional_values_are_absent() {
        env::set_var("QUIZ_TEST_BLANK", "   ");
        assert_eq!(get_env_opt("QUIZ_TEST_BLANK"), None);
        assert_eq!(get_env_or("QUIZ_TEST_BLANK", "fallback"), "fallback");
    }
}
