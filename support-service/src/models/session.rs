//! Session model for conversation persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender of a message within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    /// Engine-appended markers only (e.g., the end-of-session note).
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// A message in a session. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,

    pub text: String,

    /// When the message was appended.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// A customer-support conversation thread with ordered history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub session_id: String,

    /// Owner reference from the identity provider. None for anonymous sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Messages in strict append order.
    pub messages: Vec<ChatMessage>,

    /// Total number of messages.
    pub message_count: i32,

    /// Whether a terminal end-of-session marker has been appended.
    #[serde(default)]
    pub ended: bool,

    /// When the session was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// When the session was last updated.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session with empty history.
    pub fn new(user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            messages: Vec::new(),
            message_count: 0,
            ended: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message, keeping count and update time in sync.
    pub fn add_message(&mut self, role: MessageRole, text: String) {
        self.messages.push(ChatMessage {
            role,
            text,
            timestamp: Utc::now(),
        });
        self.message_count = self.messages.len() as i32;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_message_keeps_count_and_order() {
        let mut session = Session::new(None);
        session.add_message(MessageRole::User, "first".to_string());
        session.add_message(MessageRole::Assistant, "second".to_string());

        assert_eq!(session.message_count, 2);
        assert_eq!(session.messages[0].text, "first");
        assert_eq!(session.messages[1].text, "second");
        assert_eq!(session.messages[0].role, MessageRole::User);
        assert_eq!(session.messages[1].role, MessageRole::Assistant);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
