//! On-disk shape of `claude.json`'s `mcpServers` map.

use std::collections::BTreeMap;

use agentpane_core::mcp::{McpServerConfig, McpServerType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the server map inside `claude.json`.
pub const MCP_SERVERS_KEY: &str = "mcpServers";

/// One server entry; the name is the map key, not a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerEntryDto {
    #[serde(rename = "type", default)]
    pub server_type: McpServerType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl McpServerEntryDto {
    pub fn into_config(self, name: String) -> McpServerConfig {
        McpServerConfig {
            name,
            server_type: self.server_type,
            command: self.command,
            args: self.args,
            env: self.env,
            url: self.url,
        }
    }
}

impl From<McpServerConfig> for McpServerEntryDto {
    fn from(config: McpServerConfig) -> Self {
        Self {
            server_type: config.server_type,
            command: config.command,
            args: config.args,
            env: config.env,
            url: config.url,
        }
    }
}

/// Reads the server map out of the whole `claude.json` document.
///
/// Entries that don't parse are skipped with a warning rather than failing
/// the whole document, since other tools write this file too.
pub fn servers_from_document(document: &Map<String, Value>) -> BTreeMap<String, McpServerConfig> {
    let Some(Value::Object(servers)) = document.get(MCP_SERVERS_KEY) else {
        return BTreeMap::new();
    };

    servers
        .iter()
        .filter_map(|(name, value)| {
            match serde_json::from_value::<McpServerEntryDto>(value.clone()) {
                Ok(entry) => Some((name.clone(), entry.into_config(name.clone()))),
                Err(e) => {
                    tracing::warn!("Skipping malformed MCP server '{}': {}", name, e);
                    None
                }
            }
        })
        .collect()
}

/// Takes the raw server map out of the document.
///
/// Entries this crate can't parse stay in the map untouched; a non-object
/// value under the key is replaced by an empty map.
pub fn take_servers_map(document: &mut Map<String, Value>) -> Map<String, Value> {
    match document.remove(MCP_SERVERS_KEY) {
        Some(Value::Object(servers)) => servers,
        _ => Map::new(),
    }
}

/// Puts a server map back into the document.
pub fn put_servers_map(document: &mut Map<String, Value>, servers: Map<String, Value>) {
    document.insert(MCP_SERVERS_KEY.to_string(), Value::Object(servers));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_servers_and_skips_malformed() {
        let document = json!({
            "theme": "dark",
            "mcpServers": {
                "fs": {"type": "stdio", "command": "npx", "args": ["-y", "fs"]},
                "broken": {"type": "carrier-pigeon"},
                "remote": {"type": "sse", "url": "http://localhost/sse"}
            }
        });
        let servers = servers_from_document(document.as_object().unwrap());

        assert_eq!(servers.len(), 2);
        assert_eq!(servers["fs"].command, "npx");
        assert_eq!(servers["remote"].server_type, McpServerType::Sse);
    }

    #[test]
    fn test_entry_omits_name() {
        let entry = McpServerEntryDto::from(McpServerConfig::stdio("fs", "npx", vec![]));
        let value = serde_json::to_value(entry).unwrap();
        assert!(value.get("name").is_none());
        assert_eq!(value["type"], "stdio");
    }

    #[test]
    fn test_servers_map_replaces_non_object() {
        let mut document = json!({"mcpServers": 3}).as_object().unwrap().clone();
        let mut servers = take_servers_map(&mut document);
        assert!(servers.is_empty());
        servers.insert("a".to_string(), json!({}));
        put_servers_map(&mut document, servers);
        assert!(document["mcpServers"].is_object());
    }
}
