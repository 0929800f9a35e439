//! Prompt template repository trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::prompt_template::PromptTemplate;

/// Storage for prompt templates, one document per template.
///
/// The repository does not enforce the cap or name uniqueness; the
/// template service checks both before saving.
#[async_trait]
pub trait PromptTemplateRepository: Send + Sync {
    /// Lists all templates, oldest first.
    async fn list(&self) -> Result<Vec<PromptTemplate>>;

    /// Gets a template by id.
    async fn get(&self, id: &str) -> Result<Option<PromptTemplate>>;

    /// Writes a template, replacing any previous version with the same id.
    async fn save(&self, template: &PromptTemplate) -> Result<()>;

    /// Deletes a template. Fails with `NotFound` for unknown ids.
    async fn delete(&self, id: &str) -> Result<()>;
}
