//! Unified path management for agentpane files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/agentpane/          # Storage directory
//! ├── conversations/
//! │   ├── index.json                 # Metadata of all conversations
//! │   └── <id>.json                  # One file per conversation
//! ├── prompt-templates/
//! │   └── <id>.json
//! └── logs/
//!     └── agentpane.log.YYYY-MM-DD
//!
//! ~/.config/agentpane/config.toml    # Settings
//! ~/.claude/claude.json              # MCP servers (shared with the claude CLI)
//! ```
//!
//! Setting `AGENTPANE_HOME` puts storage and config under that directory.

use std::path::PathBuf;

/// Environment variable overriding the storage and config directories.
pub const HOME_ENV: &str = "AGENTPANE_HOME";

const APP_DIR: &str = "agentpane";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolved locations of every file agentpane reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPanePaths {
    storage_dir: PathBuf,
    config_dir: PathBuf,
    home_dir: PathBuf,
}

impl AgentPanePaths {
    /// Resolves paths for the current user.
    ///
    /// `base` (or `AGENTPANE_HOME` when `base` is None) overrides the
    /// platform storage and config directories.
    pub fn new(base: Option<PathBuf>) -> Result<Self, PathError> {
        let home_dir = dirs::home_dir().ok_or(PathError::HomeDirNotFound)?;
        let base = base.or_else(|| std::env::var_os(HOME_ENV).map(PathBuf::from));

        if let Some(base) = base {
            return Ok(Self {
                storage_dir: base.clone(),
                config_dir: base,
                home_dir,
            });
        }

        let storage_dir = dirs::data_dir()
            .ok_or(PathError::HomeDirNotFound)?
            .join(APP_DIR);
        let config_dir = dirs::config_dir()
            .ok_or(PathError::HomeDirNotFound)?
            .join(APP_DIR);

        Ok(Self {
            storage_dir,
            config_dir,
            home_dir,
        })
    }

    /// Builds paths from explicit directories.
    pub fn from_dirs(storage_dir: PathBuf, config_dir: PathBuf, home_dir: PathBuf) -> Self {
        Self {
            storage_dir,
            config_dir,
            home_dir,
        }
    }

    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn conversations_dir(&self) -> PathBuf {
        self.storage_dir.join("conversations")
    }

    pub fn prompt_templates_dir(&self) -> PathBuf {
        self.storage_dir.join("prompt-templates")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.storage_dir.join("logs")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// The claude CLI's own config, which holds the `mcpServers` map.
    pub fn claude_config_file(&self) -> PathBuf {
        self.home_dir.join(".claude").join("claude.json")
    }
}
