//! File-backed implementations of the agentpane-core repository traits.

pub mod config_service;
pub mod dto;
pub mod json_conversation_repository;
pub mod json_mcp_repository;
pub mod json_prompt_template_repository;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use json_conversation_repository::JsonConversationRepository;
pub use json_mcp_repository::JsonMcpRepository;
pub use json_prompt_template_repository::JsonPromptTemplateRepository;
pub use paths::{AgentPanePaths, PathError};
