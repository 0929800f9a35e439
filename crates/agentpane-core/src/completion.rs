//! Inline completion request type shared by the panel protocol and the
//! completion provider.

use serde::{Deserialize, Serialize};

/// A request for a suggestion at a document position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub uri: String,
    /// Zero-based line of the cursor.
    pub line: u32,
    /// Zero-based character offset within the line.
    pub character: u32,
    /// Full document text.
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl CompletionRequest {
    /// Requests at the same key supersede each other.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.uri, self.line, self.character)
    }
}
