//! Inline code completion.

mod provider;
mod text;

pub use agentpane_core::completion::CompletionRequest;
pub use provider::CompletionProvider;
pub use text::{extract_snippet, trim_suggestion};
