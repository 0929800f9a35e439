//! Application layer for agentpane.
//!
//! Services coordinate the domain types in `agentpane-core` with the
//! repositories and agent clients injected at startup. [`ChatController`]
//! ties them together behind the panel message protocol.

pub mod chat_controller;
pub mod completion;
pub mod conversation_service;
pub mod mcp_service;
pub mod prompt_template_service;

#[cfg(test)]
mod testing;

pub use chat_controller::ChatController;
pub use completion::{CompletionProvider, CompletionRequest};
pub use conversation_service::ConversationService;
pub use mcp_service::McpService;
pub use prompt_template_service::{PromptTemplateService, TemplateVars};
