use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use crate::history::{ HistoryStore, StoreError };
use crate::models::chat::{ Conversation, Message, NewConversation, NewMessage };

struct StoreState {
    conversations: BTreeMap<u64, Conversation>,
    messages: BTreeMap<u64, Message>,
    next_conversation_id: u64,
    next_message_id: u64,
}

/// Process-lifetime store. Both maps and both counters sit behind one lock so
/// id allocation, timestamping and insertion are a single step.
pub struct MemoryHistoryStore {
    state: Mutex<StoreState>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                conversations: BTreeMap::new(),
                messages: BTreeMap::new(),
                next_conversation_id: 1,
                next_message_id: 1,
            }),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn create_conversation(
        &self,
        conversation: NewConversation
    ) -> Result<Conversation, StoreError> {
        let mut state = self.state.lock().await;
        let id = state.next_conversation_id;
        state.next_conversation_id += 1;

        let record = Conversation {
            id,
            title: conversation.resolved_title(),
            created_at: Utc::now(),
        };
        state.conversations.insert(id, record.clone());
        debug!("Created conversation {} ({})", id, record.title);
        Ok(record)
    }

    async fn get_conversation(&self, id: u64) -> Result<Option<Conversation>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.conversations.get(&id).cloned())
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let conversation_id = match message.conversation_id {
            Some(id) if id != 0 => id,
            _ => {
                return Err(
                    StoreError::InvalidInput("Message must have a conversation ID".to_string())
                );
            }
        };

        let mut state = self.state.lock().await;
        let id = state.next_message_id;
        state.next_message_id += 1;

        let record = Message {
            id,
            conversation_id,
            content: message.content,
            role: message.role,
            is_streamed: message.is_streamed.unwrap_or(false),
            created_at: Utc::now(),
        };
        state.messages.insert(id, record.clone());
        debug!("Stored message {} in conversation {} as {}", id, conversation_id, record.role);
        Ok(record)
    }

    async fn get_message(&self, id: u64) -> Result<Option<Message>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.messages.get(&id).cloned())
    }

    async fn get_messages_by_conversation(
        &self,
        conversation_id: u64
    ) -> Result<Vec<Message>, StoreError> {
        let state = self.state.lock().await;
        let mut messages: Vec<Message> = state.messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }
}
