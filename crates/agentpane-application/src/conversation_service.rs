//! Conversation service: owns the active conversation.
//!
//! Every mutation is applied in memory first and then written through the
//! repository. Persistence is best effort; failures are logged and the
//! in-memory state is kept, so the chat keeps working on a read-only disk.

use agentpane_core::{AgentPaneError, Result};
use agentpane_core::conversation::{
    Conversation, ConversationMessage, ConversationMetadata, ConversationRepository,
};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct ConversationService {
    repository: Arc<dyn ConversationRepository>,
    /// The one active conversation.
    current: Mutex<Conversation>,
    workspace_root: Option<String>,
}

impl ConversationService {
    /// Creates a service with a fresh, unsaved conversation.
    pub fn new(repository: Arc<dyn ConversationRepository>, workspace_root: Option<String>) -> Self {
        Self {
            repository,
            current: Mutex::new(Conversation::new(workspace_root.clone())),
            workspace_root,
        }
    }

    pub fn workspace_root(&self) -> Option<&str> {
        self.workspace_root.as_deref()
    }

    /// Snapshot of the active conversation.
    pub async fn current(&self) -> Conversation {
        self.current.lock().await.clone()
    }

    pub async fn current_id(&self) -> String {
        self.current.lock().await.id().to_string()
    }

    /// Appends a message to the active conversation and persists it.
    pub async fn add_message(&self, message: ConversationMessage) -> ConversationMessage {
        let mut current = self.current.lock().await;
        let added = current.add_message(message).clone();
        self.persist(&current).await;
        added
    }

    /// Replaces the content of a streaming message.
    ///
    /// The message may belong to a conversation that is no longer active
    /// (the user switched away mid-stream); that conversation is then
    /// updated on disk.
    pub async fn update_message(
        &self,
        conversation_id: &str,
        message_id: &str,
        content: impl Into<String>,
        is_complete: bool,
    ) -> Result<ConversationMessage> {
        let mut current = self.current.lock().await;
        if current.id() == conversation_id {
            let updated = current
                .update_message(message_id, content, is_complete)?
                .clone();
            self.persist(&current).await;
            return Ok(updated);
        }
        drop(current);

        let mut conversation = self
            .repository
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| AgentPaneError::not_found("conversation", conversation_id))?;
        let updated = conversation
            .update_message(message_id, content, is_complete)?
            .clone();
        self.persist(&conversation).await;
        Ok(updated)
    }

    /// The last `limit` completed messages of the active conversation,
    /// oldest first.
    pub async fn recent_messages(&self, limit: usize) -> Vec<ConversationMessage> {
        let current = self.current.lock().await;
        let complete: Vec<_> = current.messages.iter().filter(|m| m.is_complete).collect();
        let skip = complete.len().saturating_sub(limit);
        complete.into_iter().skip(skip).cloned().collect()
    }

    /// Replaces the active conversation with a fresh one.
    ///
    /// The previous conversation is already on disk if it had messages.
    pub async fn start_new(&self) -> Conversation {
        let mut current = self.current.lock().await;
        *current = Conversation::new(self.workspace_root.clone());
        tracing::info!("Started conversation {}", current.id());
        current.clone()
    }

    /// Makes a stored conversation the active one.
    ///
    /// Returns `None` (and leaves the active conversation alone) when it
    /// cannot be found or read.
    pub async fn load(&self, id: &str) -> Option<Conversation> {
        match self.repository.find_by_id(id).await {
            Ok(Some(conversation)) => {
                *self.current.lock().await = conversation.clone();
                tracing::info!("Loaded conversation {}", id);
                Some(conversation)
            }
            Ok(None) => {
                tracing::warn!("Conversation {} not found", id);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to load conversation {}: {}", id, e);
                None
            }
        }
    }

    /// Stored conversations, most recent first.
    pub async fn list(&self) -> Vec<ConversationMetadata> {
        self.repository.list().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to list conversations: {}", e);
            Vec::new()
        })
    }

    /// Deletes a stored conversation. Deleting the active one starts a new
    /// conversation; returns true in that case.
    pub async fn delete(&self, id: &str) -> bool {
        if let Err(e) = self.repository.delete(id).await {
            tracing::warn!("Failed to delete conversation {}: {}", id, e);
        }

        let is_current = self.current.lock().await.id() == id;
        if is_current {
            self.start_new().await;
        }
        is_current
    }

    /// Deletes every stored conversation and starts a new one.
    pub async fn clear_all(&self) -> Conversation {
        if let Err(e) = self.repository.clear_all().await {
            tracing::warn!("Failed to clear conversation history: {}", e);
        }
        self.start_new().await
    }

    async fn persist(&self, conversation: &Conversation) {
        if let Err(e) = self.repository.save(conversation).await {
            tracing::warn!("Failed to save conversation {}: {}", conversation.id(), e);
        }
    }
}
