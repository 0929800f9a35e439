//! MCP server domain model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AgentPaneError, Result};

/// Transport used to reach an MCP server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum McpServerType {
    /// Child process speaking MCP over stdin/stdout
    #[default]
    Stdio,
    /// Remote server speaking MCP over server-sent events
    Sse,
}

/// A named tool-server definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub server_type: McpServerType,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl McpServerConfig {
    /// Creates a stdio server definition.
    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            server_type: McpServerType::Stdio,
            command: command.into(),
            args,
            env: None,
            url: None,
        }
    }

    /// Creates an SSE server definition.
    pub fn sse(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_type: McpServerType::Sse,
            command: String::new(),
            args: Vec::new(),
            env: None,
            url: Some(url.into()),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Checks required fields for the server type.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AgentPaneError::validation("MCP server name is required"));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(AgentPaneError::validation(format!(
                "MCP server name '{}' may only contain letters, digits, '_', '-' and '.'",
                self.name
            )));
        }

        match self.server_type {
            McpServerType::Stdio if self.command.trim().is_empty() => Err(
                AgentPaneError::validation(format!("stdio server '{}' requires a command", self.name)),
            ),
            McpServerType::Sse if self.url.as_deref().is_none_or(|u| u.trim().is_empty()) => Err(
                AgentPaneError::validation(format!("sse server '{}' requires a url", self.name)),
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_stdio_server() {
        let server = McpServerConfig::stdio("fs", "npx", vec!["-y".into(), "server-fs".into()])
            .with_env("ROOT", "/tmp");
        assert!(server.validate().is_ok());
        assert_eq!(server.env.unwrap()["ROOT"], "/tmp");
    }

    #[test]
    fn test_stdio_requires_command() {
        let server = McpServerConfig::stdio("fs", "  ", vec![]);
        assert!(matches!(
            server.validate(),
            Err(AgentPaneError::Validation(_))
        ));
    }

    #[test]
    fn test_sse_requires_url() {
        let mut server = McpServerConfig::sse("remote", "http://localhost:3000/sse");
        assert!(server.validate().is_ok());
        server.url = None;
        assert!(server.validate().is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(McpServerConfig::stdio("", "x", vec![]).validate().is_err());
        assert!(McpServerConfig::stdio("has space", "x", vec![]).validate().is_err());
        assert!(McpServerConfig::stdio("ok_name-1.2", "x", vec![]).validate().is_ok());
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let server = McpServerConfig::sse("remote", "http://x");
        let json = serde_json::to_value(&server).unwrap();
        assert_eq!(json["type"], "sse");
        assert_eq!(McpServerType::Stdio.to_string(), "stdio");
    }
}
