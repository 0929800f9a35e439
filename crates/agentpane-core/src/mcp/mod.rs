//! MCP (Model Context Protocol) tool-server configuration.

mod model;
mod repository;

pub use model::{McpServerConfig, McpServerType};
pub use repository::McpRepository;
