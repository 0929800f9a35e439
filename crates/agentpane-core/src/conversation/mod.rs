//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: Chat message types (`MessageRole`, `ConversationMessage`)
//! - `model`: The persisted conversation (`Conversation`, `ConversationMetadata`)
//! - `repository`: Repository trait for conversation persistence

mod message;
mod model;
mod repository;

pub use message::{ConversationMessage, MessageRole};
pub use model::{Conversation, ConversationMetadata, DEFAULT_TITLE, MAX_TITLE_CHARS};
pub use repository::{ConversationRepository, MAX_INDEX_ENTRIES};
