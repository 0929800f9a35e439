//! JSON-file ConversationRepository implementation.
//!
//! Directory structure:
//! ```text
//! conversations/
//! ├── index.json        # Vec<ConversationMetadata>, most recent first
//! ├── <id-1>.json       # Conversation
//! └── <id-2>.json
//! ```
//!
//! Every mutation rewrites the affected conversation document and the whole
//! index. Index entries whose document is missing or unreadable are pruned
//! when they are noticed.

use crate::storage::{AtomicJsonFile, blocking, validate_file_id};
use agentpane_core::conversation::{
    Conversation, ConversationMetadata, ConversationRepository, MAX_INDEX_ENTRIES,
};
use agentpane_core::{AgentPaneError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.json";

type Index = Vec<ConversationMetadata>;

/// Conversation storage backed by one JSON file per conversation.
#[derive(Debug, Clone)]
pub struct JsonConversationRepository {
    dir: PathBuf,
}

impl JsonConversationRepository {
    /// Creates a repository rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_file(dir: &Path) -> AtomicJsonFile<Index> {
        AtomicJsonFile::new(dir.join(INDEX_FILE))
    }

    fn conversation_file(dir: &Path, id: &str) -> Result<AtomicJsonFile<Conversation>> {
        validate_id(id)?;
        Ok(AtomicJsonFile::new(dir.join(format!("{}.json", id))))
    }

    /// Removes `ids` from the index.
    fn prune_index(dir: &Path, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        Self::index_file(dir).update(Vec::new(), |index| {
            index.retain(|entry| !ids.contains(&entry.id));
            Ok(())
        })
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id == INDEX_FILE.trim_end_matches(".json") {
        return Err(AgentPaneError::validation(format!(
            "invalid conversation id '{}'",
            id
        )));
    }
    validate_file_id("conversation", id)
}

/// Inserts or replaces `metadata`, re-sorts, and returns the ids that fell
/// off the end of the capped index.
fn upsert_entry(index: &mut Index, metadata: ConversationMetadata) -> Vec<String> {
    index.retain(|entry| entry.id != metadata.id);
    index.push(metadata);
    index.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));

    if index.len() <= MAX_INDEX_ENTRIES {
        return Vec::new();
    }
    index
        .split_off(MAX_INDEX_ENTRIES)
        .into_iter()
        .map(|entry| entry.id)
        .collect()
}

#[async_trait]
impl ConversationRepository for JsonConversationRepository {
    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let dir = self.dir.clone();
        let conversation = conversation.clone();

        blocking(move || {
            Self::conversation_file(&dir, conversation.id())?.save(&conversation)?;

            let evicted = Self::index_file(&dir).update(Vec::new(), |index| {
                Ok(upsert_entry(index, conversation.metadata.clone()))
            })?;

            // Evicted conversations lose their file too, so the index keeps
            // covering every document on disk.
            for id in evicted {
                tracing::info!("Evicting conversation {} from history", id);
                Self::conversation_file(&dir, &id)?.remove()?;
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>> {
        let dir = self.dir.clone();
        let id = id.to_string();

        blocking(move || {
            let file = Self::conversation_file(&dir, &id)?;
            match file.load() {
                Ok(Some(conversation)) => Ok(Some(conversation)),
                Ok(None) => {
                    tracing::debug!("Conversation {} has no file; pruning index entry", id);
                    Self::prune_index(&dir, &[id])?;
                    Ok(None)
                }
                Err(e) => {
                    tracing::warn!("Conversation {} is unreadable ({}); pruning index entry", id, e);
                    Self::prune_index(&dir, &[id])?;
                    Ok(None)
                }
            }
        })
        .await
    }

    async fn list(&self) -> Result<Vec<ConversationMetadata>> {
        let dir = self.dir.clone();

        blocking(move || {
            let index = Self::index_file(&dir).load()?.unwrap_or_default();

            let (present, stale): (Vec<_>, Vec<_>) = index
                .into_iter()
                .partition(|entry| dir.join(format!("{}.json", entry.id)).is_file());

            if !stale.is_empty() {
                let stale_ids: Vec<String> = stale.into_iter().map(|e| e.id).collect();
                tracing::info!("Pruning {} stale conversation index entries", stale_ids.len());
                Self::prune_index(&dir, &stale_ids)?;
            }

            Ok(present)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let dir = self.dir.clone();
        let id = id.to_string();

        blocking(move || {
            Self::conversation_file(&dir, &id)?.remove()?;
            Self::prune_index(&dir, &[id])
        })
        .await
    }

    async fn clear_all(&self) -> Result<()> {
        let dir = self.dir.clone();

        blocking(move || {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let is_conversation = path.extension().is_some_and(|ext| ext == "json")
                    && path.file_name().is_some_and(|name| name != INDEX_FILE);
                if is_conversation {
                    fs::remove_file(&path)?;
                }
            }
            Self::index_file(&dir).save(&Vec::new())
        })
        .await
    }
}
