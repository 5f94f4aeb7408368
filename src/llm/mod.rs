pub mod chat;

use std::time::Duration;
use crate::cli::Args;
use self::chat::GenerationConfig;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub generation: GenerationConfig,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn from_args(args: &Args) -> Self {
        let api_key = if !args.google_api_key.trim().is_empty() {
            Some(args.google_api_key.trim().to_string())
        } else {
            None
        };
        let defaults = GenerationConfig::default();
        Self {
            api_key,
            completion_model: Some(args.chat_model.clone()).filter(|m| !m.trim().is_empty()),
            base_url: Some(args.chat_base_url.clone()).filter(|u| !u.trim().is_empty()),
            generation: GenerationConfig {
                temperature: args.chat_temperature.unwrap_or(defaults.temperature),
                max_output_tokens: args.chat_max_output_tokens.unwrap_or(defaults.max_output_tokens),
            },
            timeout: Duration::from_secs(args.chat_timeout_secs),
        }
    }
}
