mod memory;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use crate::models::chat::{ Conversation, Message, NewConversation, NewMessage };

pub use memory::MemoryHistoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Authoritative storage for conversations and their messages.
///
/// Lookups of unknown ids return `Ok(None)`; only malformed creation requests
/// are errors.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create_conversation(
        &self,
        conversation: NewConversation
    ) -> Result<Conversation, StoreError>;

    async fn get_conversation(&self, id: u64) -> Result<Option<Conversation>, StoreError>;

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    async fn get_message(&self, id: u64) -> Result<Option<Message>, StoreError>;

    /// Messages of one conversation, oldest first.
    async fn get_messages_by_conversation(
        &self,
        conversation_id: u64
    ) -> Result<Vec<Message>, StoreError>;
}

pub fn initialize_history_store() -> Arc<dyn HistoryStore> {
    info!("Chat history will be kept in memory for the lifetime of the process");
    Arc::new(MemoryHistoryStore::new())
}
