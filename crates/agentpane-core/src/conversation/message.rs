//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Message produced by the coding agent.
    Assistant,
}

/// A single message in a conversation.
///
/// Assistant messages are created empty with `is_complete == false` and
/// have their content replaced while the agent streams. Once marked
/// complete a message is never modified again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_complete")]
    pub is_complete: bool,
}

fn default_complete() -> bool {
    true
}

impl ConversationMessage {
    /// Creates a completed user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_complete: true,
        }
    }

    /// Creates a completed assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            is_complete: true,
        }
    }

    /// Creates the empty assistant message that a streaming response fills in.
    pub fn streaming_placeholder() -> Self {
        Self {
            is_complete: false,
            ..Self::assistant(String::new())
        }
    }
}
