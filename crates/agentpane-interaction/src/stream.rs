//! Events emitted by `claude --output-format stream-json`.
//!
//! One JSON object per stdout line, tagged by `type`. Only the fields the
//! accumulator needs are modelled; everything else is ignored.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Session init and other housekeeping.
    System {
        #[serde(default)]
        subtype: Option<String>,
    },
    /// A model turn: text, tool calls and thinking blocks.
    Assistant { message: AssistantMessage },
    /// Tool results fed back to the model.
    User {},
    /// Terminal message of a run.
    Result {
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        result: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },
    Thinking {},
    #[serde(other)]
    Other,
}

/// Parses one stdout line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<StreamEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
