use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const MAX_CONTENT_CHARS: usize = 10_000;
pub const DEFAULT_SESSION_KEY: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    #[serde(alias = "User")]
    User,
    #[serde(alias = "assistant", alias = "Assistant")]
    Ai,
}

impl Sender {
    // Anything but `user` came from the agent.
    pub fn from_role(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            Sender::User
        } else {
            Sender::Ai
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoredMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub session_key: String,
    pub sender: Sender,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: bson::DateTime,
}

impl StoredMessage {
    pub fn new(session_key: String, sender: Sender, content: &str, metadata: Option<serde_json::Value>) -> Self {
        Self {
            id: ObjectId::new(),
            session_key,
            sender,
            content: truncate_chars(content, MAX_CONTENT_CHARS),
            metadata,
            created_at: bson::DateTime::now(),
        }
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    pub fn created_at_rfc3339(&self) -> String {
        self.created_at.try_to_rfc3339_string().unwrap_or_default()
    }

    pub fn to_message(&self) -> Message {
        Message {
            id: self.id.to_hex(),
            content: self.content.clone(),
            sender: self.sender,
            timestamp: self.created_at_rfc3339(),
            metadata: None,
        }
    }
}

// Counts chars, not bytes.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
