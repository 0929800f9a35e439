//! MCP server management on top of an injected [`McpRepository`].

use agentpane_core::Result;
use agentpane_core::mcp::{McpRepository, McpServerConfig};
use std::sync::Arc;

pub struct McpService {
    repository: Arc<dyn McpRepository>,
}

impl McpService {
    pub fn new(repository: Arc<dyn McpRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> Result<Vec<McpServerConfig>> {
        self.repository.list().await
    }

    pub async fn get(&self, name: &str) -> Result<Option<McpServerConfig>> {
        self.repository.get(name).await
    }

    /// Adds a new server. Invalid definitions and taken names are rejected
    /// before anything is written.
    pub async fn add(&self, server: McpServerConfig) -> Result<()> {
        server.validate()?;
        self.repository.add(server).await
    }

    /// Adds or replaces a server.
    pub async fn upsert(&self, server: McpServerConfig) -> Result<()> {
        server.validate()?;
        self.repository.upsert(server).await
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        self.repository.remove(name).await
    }
}
