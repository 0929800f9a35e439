//! Conversation repository trait.

use super::model::{Conversation, ConversationMetadata};
use crate::error::Result;
use async_trait::async_trait;

/// Maximum number of entries kept in the conversation index.
pub const MAX_INDEX_ENTRIES: usize = 50;

/// An abstract repository for conversation persistence.
///
/// Implementations keep one document per conversation plus an index of
/// metadata entries sorted by `last_activity` (most recent first) and
/// capped at [`MAX_INDEX_ENTRIES`]. Every id in the index must have a
/// readable document; implementations prune entries that don't.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Writes the conversation document and refreshes its index entry.
    async fn save(&self, conversation: &Conversation) -> Result<()>;

    /// Loads a conversation.
    ///
    /// - `Ok(Some(_))`: conversation found
    /// - `Ok(None)`: no such conversation (a stale index entry is pruned)
    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>>;

    /// Returns the index, most recent first.
    async fn list(&self) -> Result<Vec<ConversationMetadata>>;

    /// Removes the document and the index entry. Missing ids are not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Removes every conversation and empties the index.
    async fn clear_all(&self) -> Result<()>;
}
