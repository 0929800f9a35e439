//! Configuration service implementation.
//!
//! Loads [`Settings`] from `config.toml` and caches them. A missing file
//! yields defaults; a file that fails to parse is reported as a config error
//! rather than silently replaced.

use crate::storage::write_atomic;
use agentpane_core::config::Settings;
use agentpane_core::{AgentPaneError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the settings file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached settings, filled on first access.
    settings: Arc<RwLock<Option<Settings>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the settings, loading from file if not cached.
    pub fn settings(&self) -> Result<Settings> {
        {
            let cached = self.settings.read().unwrap_or_else(|e| e.into_inner());
            if let Some(settings) = cached.as_ref() {
                return Ok(settings.clone());
            }
        }

        let loaded = self.load()?;
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Writes `settings` to disk and replaces the cached copy.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let content = toml::to_string_pretty(settings)?;
        write_atomic(&self.path, content.as_bytes())?;
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = Some(settings.clone());
        tracing::info!("Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Writes a default settings file if none exists. Returns true when a
    /// file was created.
    pub fn init(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&Settings::default())?;
        Ok(true)
    }

    fn load(&self) -> Result<Settings> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {:?}; using defaults", self.path);
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            AgentPaneError::config(format!("Failed to parse {:?}: {}", self.path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentpane_core::config::ThinkingMode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));

        assert_eq!(service.settings().unwrap(), Settings::default());
        assert!(!service.path().exists());
    }

    #[test]
    fn test_init_then_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("nested/config.toml"));

        assert!(service.init().unwrap());
        assert!(!service.init().unwrap());

        let mut settings = service.settings().unwrap();
        settings.agent.thinking = ThinkingMode::Normal;
        settings.completion.debounce_ms = 450;
        service.save(&settings).unwrap();

        let reloaded = ConfigService::new(service.path().to_path_buf());
        assert_eq!(reloaded.settings().unwrap(), settings);
    }

    #[test]
    fn test_settings_are_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::new(path.clone());
        assert_eq!(service.settings().unwrap().completion.debounce_ms, 300);

        fs::write(&path, "[completion]\ndebounce_ms = 900\n").unwrap();
        assert_eq!(service.settings().unwrap().completion.debounce_ms, 300);
        assert_eq!(
            ConfigService::new(path).settings().unwrap().completion.debounce_ms,
            900
        );
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[agent\nmodel = ").unwrap();

        let err = ConfigService::new(path).settings().unwrap_err();
        assert!(matches!(err, AgentPaneError::Config(_)));
    }
}
