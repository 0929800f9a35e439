use serde::{Deserialize, Serialize};

use crate::conversation::ConversationMessage;

/// Text around the cursor in the file being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnippet {
    pub path: String,
    pub line: u32,
    pub character: u32,
    pub before_cursor: String,
    pub after_cursor: String,
}

/// Everything besides the prompt that goes into the agent prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContext {
    /// Recent conversation turns, oldest first.
    #[serde(default)]
    pub conversation: Vec<ConversationMessage>,
    /// Workspace root; the agent is restricted to this directory.
    #[serde(default)]
    pub workspace_root: Option<String>,
    #[serde(default)]
    pub file: Option<FileSnippet>,
    /// Extra instructions, e.g. a rendered prompt template.
    #[serde(default)]
    pub instructions: Option<String>,
}

/// A single request to the coding agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: AgentContext,
    #[serde(default)]
    pub language: Option<String>,
}

impl AgentRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: AgentContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Result of an agent call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Accumulated response text (possibly partial when `error` is set).
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    pub fn ok(suggestion: impl Into<String>) -> Self {
        Self {
            suggestion: suggestion.into(),
            error: None,
        }
    }

    pub fn failed(partial: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            suggestion: partial.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
