pub mod agent;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod mcp;
pub mod prompt_template;
pub mod protocol;

// Re-export common error type
pub use error::{AgentPaneError, Result};
