pub mod gemini;

use async_trait::async_trait;
use log::{ debug, info };
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use self::gemini::GeminiChatClient;
use super::LlmConfig;
use crate::models::chat::{ Message, Role };

/// Errors surfaced by the response generator. Every variant renders a message
/// that can be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Gemini API error: GOOGLE_API_KEY is not set in environment variables")]
    MissingCredential,

    #[error(
        "Gemini API error: Google Generative AI API is not enabled for this API key. \
         Please visit the Google Cloud Console to enable the API for your project, \
         or provide a different API key that has the Generative AI API enabled."
    )]
    ServiceNotEnabled,

    #[error(
        "Gemini API error: The provided API key is invalid. Please check your API key and try again."
    )]
    InvalidCredential,

    #[error("Gemini API error: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// Everything the remote service needs for one round trip: prior turns, the
/// new prompt and sampling parameters.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub history: Vec<ChatTurn>,
    pub prompt: String,
    pub config: GenerationConfig,
}

/// Boundary to the remote generative-text service. Implementations are the
/// only place where upstream failures are classified into [`GenerationError`].
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(
        &self,
        credential: &str,
        request: &ChatRequest
    ) -> Result<String, GenerationError>;

    fn get_model(&self) -> String;
}

/// Keeps user and assistant messages, in order, as upstream turns.
pub fn format_history(history: &[Message]) -> Vec<ChatTurn> {
    history
        .iter()
        .filter_map(|msg| {
            match msg.role {
                Role::User => Some(ChatTurn::user(msg.content.clone())),
                Role::Assistant => Some(ChatTurn::model(msg.content.clone())),
                Role::Other(_) => None,
            }
        })
        .collect()
}

/// A chat seeded with prior turns. Successful sends extend the history with
/// both sides of the exchange.
pub struct ChatSession<'a> {
    backend: &'a dyn ChatBackend,
    credential: &'a str,
    history: Vec<ChatTurn>,
    config: GenerationConfig,
}

impl<'a> ChatSession<'a> {
    pub fn start(
        backend: &'a dyn ChatBackend,
        credential: &'a str,
        history: Vec<ChatTurn>,
        config: GenerationConfig
    ) -> Self {
        Self { backend, credential, history, config }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub async fn send_message(&mut self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            history: self.history.clone(),
            prompt: prompt.to_string(),
            config: self.config,
        };
        let text = self.backend.send_chat(self.credential, &request).await?;
        self.history.push(ChatTurn::user(prompt));
        self.history.push(ChatTurn::model(text.clone()));
        Ok(text)
    }
}

pub struct ResponseGenerator {
    backend: Arc<dyn ChatBackend>,
    credential: Option<String>,
    config: GenerationConfig,
}

impl ResponseGenerator {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        credential: Option<String>,
        config: GenerationConfig
    ) -> Self {
        Self { backend, credential, config }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let backend = new_client(config)?;
        Ok(Self::new(backend, config.api_key.clone(), config.generation))
    }

    pub fn model(&self) -> String {
        self.backend.get_model()
    }

    /// Produces the full reply to `prompt` given the prior messages of the
    /// conversation. Fails without touching the network when no credential is
    /// configured.
    pub async fn generate(
        &self,
        prompt: &str,
        history: &[Message]
    ) -> Result<String, GenerationError> {
        let credential = match self.credential.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(GenerationError::MissingCredential);
            }
        };

        let turns = format_history(history);
        debug!(
            "Starting chat session: model={} prior_turns={} (from {} stored messages)",
            self.backend.get_model(),
            turns.len(),
            history.len()
        );
        let mut session = ChatSession::start(self.backend.as_ref(), credential, turns, self.config);
        let reply = session.send_message(prompt).await?;
        info!("Generated reply of {} chars", reply.len());
        Ok(reply)
    }
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatBackend>, GenerationError> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
