//! Prompt template create/update request model.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{PromptTemplate, default_category};
use crate::error::{AgentPaneError, Result};

/// Request to create or edit a prompt template.
///
/// Used by both the panel (`saveTemplate`) and the `templates add` command.
/// When `id` is set the request edits that template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePromptTemplateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub template: String,
}

impl SavePromptTemplateRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AgentPaneError::validation(
                "Name is required and cannot be empty",
            ));
        }
        if self.template.trim().is_empty() {
            return Err(AgentPaneError::validation(
                "Template text is required and cannot be empty",
            ));
        }
        Ok(())
    }

    /// Converts this request into a new, inactive template.
    pub fn into_template(self) -> PromptTemplate {
        let now = Utc::now();
        PromptTemplate {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name.trim().to_string(),
            description: self.description,
            category: self.category,
            template: self.template,
            is_active: false,
            created: now,
            modified: now,
        }
    }

    /// Applies this request to an existing template, keeping id, activation
    /// and creation time.
    pub fn apply_to(self, existing: &PromptTemplate) -> PromptTemplate {
        PromptTemplate {
            id: existing.id.clone(),
            name: self.name.trim().to_string(),
            description: self.description,
            category: self.category,
            template: self.template,
            is_active: existing.is_active,
            created: existing.created,
            modified: Utc::now(),
        }
    }
}
