//! JSON-file PromptTemplateRepository implementation.
//!
//! Each template is stored as `<dir>/<id>.json`.

use crate::storage::{AtomicJsonFile, blocking, validate_file_id};
use agentpane_core::prompt_template::{PromptTemplate, PromptTemplateRepository};
use agentpane_core::{AgentPaneError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonPromptTemplateRepository {
    dir: PathBuf,
}

impl JsonPromptTemplateRepository {
    /// Creates a repository rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn template_file(dir: &Path, id: &str) -> Result<AtomicJsonFile<PromptTemplate>> {
        validate_file_id("prompt template", id)?;
        Ok(AtomicJsonFile::new(dir.join(format!("{}.json", id))))
    }
}

#[async_trait]
impl PromptTemplateRepository for JsonPromptTemplateRepository {
    async fn list(&self) -> Result<Vec<PromptTemplate>> {
        let dir = self.dir.clone();

        blocking(move || {
            let mut templates = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                match AtomicJsonFile::<PromptTemplate>::new(&path).load() {
                    Ok(Some(template)) => templates.push(template),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Skipping unreadable template {:?}: {}", path, e),
                }
            }
            templates.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
            Ok(templates)
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<PromptTemplate>> {
        let dir = self.dir.clone();
        let id = id.to_string();
        blocking(move || Self::template_file(&dir, &id)?.load()).await
    }

    async fn save(&self, template: &PromptTemplate) -> Result<()> {
        let dir = self.dir.clone();
        let template = template.clone();
        blocking(move || Self::template_file(&dir, &template.id)?.save(&template)).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let dir = self.dir.clone();
        let id = id.to_string();

        blocking(move || {
            let file = Self::template_file(&dir, &id)?;
            if !file.path().is_file() {
                return Err(AgentPaneError::not_found("prompt template", id));
            }
            file.remove()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn template(id: &str, minutes_ago: i64) -> PromptTemplate {
        let created = Utc::now() - Duration::minutes(minutes_ago);
        PromptTemplate {
            id: id.to_string(),
            name: format!("Template {}", id),
            description: String::new(),
            category: "general".to_string(),
            template: "{{ prompt }}".to_string(),
            is_active: false,
            created,
            modified: created,
        }
    }

    async fn repository(temp_dir: &TempDir) -> JsonPromptTemplateRepository {
        JsonPromptTemplateRepository::new(temp_dir.path().join("prompt-templates"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_get_and_list_oldest_first() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir).await;

        repository.save(&template("newer", 1)).await.unwrap();
        repository.save(&template("older", 10)).await.unwrap();

        let ids: Vec<_> = repository
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["older", "newer"]);

        let loaded = repository.get("newer").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Template newer");
        assert!(repository.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir).await;
        repository.save(&template("a", 0)).await.unwrap();

        repository.delete("a").await.unwrap();
        assert!(repository.list().await.unwrap().is_empty());
        assert!(repository.delete("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir).await;
        repository.save(&template("good", 0)).await.unwrap();
        fs::write(
            temp_dir.path().join("prompt-templates").join("bad.json"),
            "{ nope",
        )
        .unwrap();

        let templates = repository.list().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "good");
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir).await;

        let err = repository.get("../escape").await.unwrap_err();
        assert!(matches!(err, AgentPaneError::Validation(_)));
    }
}
