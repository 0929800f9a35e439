//! McpRepository backed by the claude CLI's `claude.json`.
//!
//! The server map lives under the `mcpServers` key; every other key of the
//! document belongs to the CLI and is written back unchanged. The parsed
//! server map is cached and re-read only when the file's mtime changes.

use crate::dto::{McpServerEntryDto, put_servers_map, servers_from_document, take_servers_map};
use crate::storage::{AtomicJsonFile, blocking};
use agentpane_core::mcp::{McpRepository, McpServerConfig};
use agentpane_core::{AgentPaneError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

type Document = Map<String, Value>;

#[derive(Debug, Clone)]
struct CachedServers {
    modified: Option<SystemTime>,
    servers: BTreeMap<String, McpServerConfig>,
}

/// MCP server store over a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonMcpRepository {
    file: AtomicJsonFile<Document>,
    cache: Arc<Mutex<Option<CachedServers>>>,
}

enum Write {
    Insert { server: McpServerConfig, replace: bool },
    Remove { name: String },
}

impl JsonMcpRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    fn load_servers(
        file: &AtomicJsonFile<Document>,
        cache: &Mutex<Option<CachedServers>>,
    ) -> Result<BTreeMap<String, McpServerConfig>> {
        let modified = file.modified();
        let mut cached = cache.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = cached.as_ref() {
            if entry.modified == modified && modified.is_some() {
                return Ok(entry.servers.clone());
            }
        }

        let document = file.load()?.unwrap_or_default();
        let servers = servers_from_document(&document);
        *cached = Some(CachedServers {
            modified,
            servers: servers.clone(),
        });
        Ok(servers)
    }

    async fn write(&self, write: Write) -> Result<()> {
        let file = self.file.clone();
        let cache = Arc::clone(&self.cache);

        blocking(move || {
            let result = file.update(Document::new(), |document| {
                let mut servers = take_servers_map(document);
                match write {
                    Write::Insert { server, replace } => {
                        if !replace && servers.contains_key(&server.name) {
                            return Err(AgentPaneError::duplicate("MCP server", server.name));
                        }
                        let name = server.name.clone();
                        let entry = serde_json::to_value(McpServerEntryDto::from(server))?;
                        servers.insert(name, entry);
                    }
                    Write::Remove { name } => {
                        if servers.remove(&name).is_none() {
                            return Err(AgentPaneError::not_found("MCP server", name));
                        }
                    }
                }
                put_servers_map(document, servers);
                Ok(())
            });

            *cache.lock().unwrap_or_else(|e| e.into_inner()) = None;
            result
        })
        .await
    }
}

#[async_trait]
impl McpRepository for JsonMcpRepository {
    async fn list(&self) -> Result<Vec<McpServerConfig>> {
        let file = self.file.clone();
        let cache = Arc::clone(&self.cache);
        let servers = blocking(move || Self::load_servers(&file, &cache)).await?;
        Ok(servers.into_values().collect())
    }

    async fn get(&self, name: &str) -> Result<Option<McpServerConfig>> {
        let file = self.file.clone();
        let cache = Arc::clone(&self.cache);
        let mut servers = blocking(move || Self::load_servers(&file, &cache)).await?;
        Ok(servers.remove(name))
    }

    async fn add(&self, server: McpServerConfig) -> Result<()> {
        server.validate()?;
        tracing::info!("Adding MCP server '{}'", server.name);
        self.write(Write::Insert {
            server,
            replace: false,
        })
        .await
    }

    async fn upsert(&self, server: McpServerConfig) -> Result<()> {
        server.validate()?;
        tracing::info!("Saving MCP server '{}'", server.name);
        self.write(Write::Insert {
            server,
            replace: true,
        })
        .await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        tracing::info!("Removing MCP server '{}'", name);
        self.write(Write::Remove {
            name: name.to_string(),
        })
        .await
    }
}
