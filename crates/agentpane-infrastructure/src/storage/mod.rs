//! Storage layer for atomic file operations.

mod atomic_json;

pub use atomic_json::{AtomicJsonFile, write_atomic};

use agentpane_core::{AgentPaneError, Result};

/// Runs synchronous file work on the blocking thread pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AgentPaneError::internal(format!("storage task failed: {}", e)))?
}

/// Ids become file names, so only plain names are accepted.
pub(crate) fn validate_file_id(entity_type: &str, id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AgentPaneError::validation(format!(
            "invalid {} id '{}'",
            entity_type, id
        )))
    }
}
