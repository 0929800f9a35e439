//! Prompt template domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of stored templates.
pub const MAX_TEMPLATES: usize = 10;

/// A named prompt template.
///
/// `template` is a minijinja template; the variables `prompt`, `language`,
/// `workspace` and `file` are available when it is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub template: String,
    #[serde(default)]
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

pub(crate) fn default_category() -> String {
    "general".to_string()
}

impl PromptTemplate {
    /// Case-insensitive name comparison used for deduplication.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}
