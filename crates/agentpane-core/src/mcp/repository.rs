//! MCP configuration repository trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::mcp::McpServerConfig;

/// Repository for named MCP server definitions.
///
/// Servers are keyed by name. Every mutation rewrites the whole backing
/// document.
#[async_trait]
pub trait McpRepository: Send + Sync {
    /// Lists all servers, sorted by name.
    async fn list(&self) -> Result<Vec<McpServerConfig>>;

    /// Gets a specific server by name.
    async fn get(&self, name: &str) -> Result<Option<McpServerConfig>>;

    /// Adds a server. Fails with `Duplicate` if the name is taken, leaving
    /// the stored document untouched.
    async fn add(&self, server: McpServerConfig) -> Result<()>;

    /// Adds or replaces a server (last write wins).
    async fn upsert(&self, server: McpServerConfig) -> Result<()>;

    /// Removes a server. Fails with `NotFound` for unknown names.
    async fn remove(&self, name: &str) -> Result<()>;
}
