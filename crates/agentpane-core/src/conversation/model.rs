//! Conversation domain model.

use super::message::{ConversationMessage, MessageRole};
use crate::error::{AgentPaneError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title used until the first user message arrives.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Titles derived from the first user message are cut to this many characters.
pub const MAX_TITLE_CHARS: usize = 50;

/// Metadata of a conversation. A copy of it is stored in the index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<String>,
}

/// A persisted chat session: metadata plus the ordered message list.
///
/// The message list is append-only. `metadata.message_count` always equals
/// `messages.len()` and `metadata.last_activity` never moves backwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub metadata: ConversationMetadata,
    pub messages: Vec<ConversationMessage>,
}

impl Conversation {
    /// Starts an empty conversation.
    pub fn new(workspace_root: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            metadata: ConversationMetadata {
                id: Uuid::new_v4().to_string(),
                title: DEFAULT_TITLE.to_string(),
                start_time: now,
                last_activity: now,
                message_count: 0,
                workspace_root,
            },
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Appends a message and updates the metadata.
    pub fn add_message(&mut self, message: ConversationMessage) -> &ConversationMessage {
        if message.role == MessageRole::User && self.metadata.title == DEFAULT_TITLE {
            if let Some(title) = derive_title(&message.content) {
                self.metadata.title = title;
            }
        }

        self.touch(message.timestamp);
        self.messages.push(message);
        self.metadata.message_count = self.messages.len();

        // Safe to index: we just pushed an element
        &self.messages[self.messages.len() - 1]
    }

    /// Replaces the content of a message that is still streaming.
    ///
    /// Fails with `NotFound` for an unknown id and with `Validation` if the
    /// message was already marked complete.
    pub fn update_message(
        &mut self,
        message_id: &str,
        content: impl Into<String>,
        is_complete: bool,
    ) -> Result<&ConversationMessage> {
        let position = self
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| AgentPaneError::not_found("message", message_id))?;

        if self.messages[position].is_complete {
            return Err(AgentPaneError::validation(format!(
                "message '{}' is complete and can no longer change",
                message_id
            )));
        }

        let message = &mut self.messages[position];
        message.content = content.into();
        message.is_complete = is_complete;

        self.touch(Utc::now());
        Ok(&self.messages[position])
    }

    pub fn message(&self, message_id: &str) -> Option<&ConversationMessage> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Moves `last_activity` forward, never backwards.
    fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.metadata.last_activity {
            self.metadata.last_activity = at;
        }
    }
}

/// First non-empty line of `content`, truncated to [`MAX_TITLE_CHARS`].
fn derive_title(content: &str) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    if line.chars().count() <= MAX_TITLE_CHARS {
        return Some(line.to_string());
    }
    let truncated: String = line.chars().take(MAX_TITLE_CHARS).collect();
    Some(format!("{}...", truncated))
}
