use crate::cli::Args;
use crate::history::{ initialize_history_store, HistoryStore, StoreError };
use crate::llm::chat::{ GenerationError, ResponseGenerator };
use crate::llm::LlmConfig;
use crate::models::chat::{ Conversation, Message, NewConversation, NewMessage, Role };

use log::{ error, info, warn };
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Conversation {0} not found")]
    ConversationNotFound(u64),

    #[error("Message {0} not found")]
    MessageNotFound(u64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Both sides of one completed chat turn, as stored.
#[derive(Debug, Clone)]
pub struct ChatTurnResult {
    pub user_message: Message,
    pub assistant_message: Message,
}

/// Runs chat turns against the store and the response generator.
#[derive(Clone)]
pub struct ChatAgent {
    history_store: Arc<dyn HistoryStore>,
    generator: Arc<ResponseGenerator>,
}

impl ChatAgent {
    pub fn new(args: &Args) -> Result<Self, AgentError> {
        let llm_config = LlmConfig::from_args(args);
        if llm_config.api_key.is_none() {
            warn!("GOOGLE_API_KEY is not set; chat requests will fail until it is provided");
        }
        let generator = ResponseGenerator::from_config(&llm_config)?;
        info!(
            "Chat client configured: Model={}, BaseURL={:?}",
            generator.model(),
            llm_config.base_url.as_deref().unwrap_or("adapter default")
        );
        Ok(Self::with_parts(initialize_history_store(), Arc::new(generator)))
    }

    pub fn with_parts(
        history_store: Arc<dyn HistoryStore>,
        generator: Arc<ResponseGenerator>
    ) -> Self {
        Self { history_store, generator }
    }

    pub async fn create_conversation(
        &self,
        request: NewConversation
    ) -> Result<Conversation, AgentError> {
        let conversation = self.history_store.create_conversation(request).await?;
        info!("Created conversation {} '{}'", conversation.id, conversation.title);
        Ok(conversation)
    }

    pub async fn get_conversation(&self, id: u64) -> Result<Option<Conversation>, AgentError> {
        Ok(self.history_store.get_conversation(id).await?)
    }

    pub async fn get_message(&self, id: u64) -> Result<Message, AgentError> {
        self.history_store.get_message(id).await?.ok_or(AgentError::MessageNotFound(id))
    }

    pub async fn conversation_messages(
        &self,
        conversation_id: u64
    ) -> Result<Vec<Message>, AgentError> {
        self.require_conversation(conversation_id).await?;
        Ok(self.history_store.get_messages_by_conversation(conversation_id).await?)
    }

    /// Asks the generator for a reply using the conversation's prior messages
    /// as context, then records the prompt and the reply.
    ///
    /// Nothing is stored when generation fails.
    pub async fn process_message(
        &self,
        conversation_id: u64,
        content: &str
    ) -> Result<ChatTurnResult, AgentError> {
        self.require_conversation(conversation_id).await?;

        let history = self.history_store.get_messages_by_conversation(conversation_id).await?;
        let reply = self.generator
            .generate(content, &history).await
            .map_err(|e| {
                error!("LLM interaction error in conversation {}: {}", conversation_id, e);
                e
            })?;

        let user_message = self.history_store.create_message(
            NewMessage::new(conversation_id, Role::User, content)
        ).await?;
        let assistant_message = self.history_store.create_message(
            NewMessage::new(conversation_id, Role::Assistant, reply)
        ).await?;

        Ok(ChatTurnResult { user_message, assistant_message })
    }

    async fn require_conversation(&self, id: u64) -> Result<Conversation, AgentError> {
        self.history_store
            .get_conversation(id).await?
            .ok_or(AgentError::ConversationNotFound(id))
    }
}
