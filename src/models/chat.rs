use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use std::fmt;

pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Author of a stored message. Anything other than `user`/`assistant` is kept
/// verbatim so storage stays lossless.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        if s == "user" {
            Role::User
        } else if s == "assistant" {
            Role::Assistant
        } else {
            Role::Other(s)
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub conversation_id: u64,
    pub content: String,
    pub role: Role,
    /// Provenance only; nothing reads it yet.
    pub is_streamed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewConversation {
    pub title: Option<String>,
}

impl NewConversation {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()) }
    }

    /// Empty titles count as missing.
    pub fn resolved_title(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => DEFAULT_CONVERSATION_TITLE.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: Option<u64>,
    pub content: String,
    pub role: Role,
    pub is_streamed: Option<bool>,
}

impl NewMessage {
    pub fn new(conversation_id: u64, role: impl Into<Role>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            content: content.into(),
            role: role.into(),
            is_streamed: None,
        }
    }
}
