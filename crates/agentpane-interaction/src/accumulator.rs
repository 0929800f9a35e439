//! Folds stream events into the single response string shown to the user.

use crate::stream::{ContentBlock, StreamEvent};
use serde_json::Value;

/// Input keys tried, in order, for a tool summary argument.
const SUMMARY_ARG_KEYS: &[&str] = &[
    "file_path",
    "path",
    "command",
    "pattern",
    "url",
    "query",
    "description",
];

const MAX_SUMMARY_ARG_CHARS: usize = 80;

/// What applying one event did to the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStep {
    /// Text grew; listeners should be notified.
    Updated,
    /// Nothing visible changed.
    Ignored,
    /// Terminal `result` event. `Err` carries the agent's error message.
    Finished(Result<(), String>),
}

#[derive(Debug, Clone, Default)]
pub struct ResponseAccumulator {
    text: String,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push_text(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    /// Appends a `● Name(arg)` line, starting a new line if needed.
    pub fn push_tool_use(&mut self, name: &str, input: &Value) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(&summarize_tool_use(name, input));
        self.text.push('\n');
    }

    pub fn apply(&mut self, event: StreamEvent) -> StreamStep {
        match event {
            StreamEvent::Assistant { message } => {
                let before = self.text.len();
                for block in message.content {
                    match block {
                        ContentBlock::Text { text } => self.push_text(&text),
                        ContentBlock::ToolUse { name, input } => self.push_tool_use(&name, &input),
                        ContentBlock::Thinking {} | ContentBlock::Other => {}
                    }
                }
                if self.text.len() > before {
                    StreamStep::Updated
                } else {
                    StreamStep::Ignored
                }
            }
            StreamEvent::Result {
                is_error, result, ..
            } => {
                if is_error {
                    let message = result
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| "Agent reported an error".to_string());
                    return StreamStep::Finished(Err(message));
                }
                if self.text.is_empty() {
                    if let Some(result) = result {
                        self.text = result;
                    }
                }
                StreamStep::Finished(Ok(()))
            }
            StreamEvent::System { .. } | StreamEvent::User {} | StreamEvent::Unknown => {
                StreamStep::Ignored
            }
        }
    }
}

/// One-line summary of a tool invocation, e.g. `● Read(src/lib.rs)`.
pub fn summarize_tool_use(name: &str, input: &Value) -> String {
    let arg = SUMMARY_ARG_KEYS
        .iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
        .map(|arg| arg.trim())
        .filter(|arg| !arg.is_empty());

    match arg {
        Some(arg) => format!("● {}({})", name, truncate(arg)),
        None => format!("● {}", name),
    }
}

fn truncate(arg: &str) -> String {
    // Multi-line commands collapse to their first line.
    let first_line = arg.lines().next().unwrap_or_default();
    if first_line.chars().count() <= MAX_SUMMARY_ARG_CHARS && first_line.len() == arg.len() {
        return arg.to_string();
    }
    let kept: String = first_line
        .chars()
        .take(MAX_SUMMARY_ARG_CHARS.saturating_sub(3))
        .collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{AssistantMessage, parse_line};
    use serde_json::json;

    fn text_event(text: &str) -> StreamEvent {
        StreamEvent::Assistant {
            message: AssistantMessage {
                content: vec![ContentBlock::Text {
                    text: text.to_string(),
                }],
            },
        }
    }

    #[test]
    fn test_chunks_concatenate() {
        let mut acc = ResponseAccumulator::new();
        for chunk in ["A", "B", "C"] {
            assert_eq!(acc.apply(text_event(chunk)), StreamStep::Updated);
        }
        assert_eq!(acc.text(), "ABC");
    }

    #[test]
    fn test_tool_summary_on_own_line() {
        let mut acc = ResponseAccumulator::new();
        acc.push_text("Let me look");
        acc.push_tool_use("Read", &json!({"file_path": "src/lib.rs"}));
        acc.push_text("Found it.");

        assert_eq!(acc.text(), "Let me look\n● Read(src/lib.rs)\nFound it.");
    }

    #[test]
    fn test_summary_argument_priority() {
        assert_eq!(
            summarize_tool_use("Grep", &json!({"pattern": "fn main", "path": "src"})),
            "● Grep(src)"
        );
        assert_eq!(
            summarize_tool_use("Bash", &json!({"command": "cargo fmt"})),
            "● Bash(cargo fmt)"
        );
        assert_eq!(summarize_tool_use("TodoWrite", &json!({"todos": []})), "● TodoWrite");
        assert_eq!(summarize_tool_use("LS", &Value::Null), "● LS");
    }

    #[test]
    fn test_long_argument_truncated() {
        let long = "x".repeat(120);
        let summary = summarize_tool_use("Bash", &json!({ "command": long }));
        assert_eq!(summary, format!("● Bash({}...)", "x".repeat(77)));

        let multi = summarize_tool_use("Bash", &json!({"command": "echo a\necho b"}));
        assert_eq!(multi, "● Bash(echo a...)");
    }

    #[test]
    fn test_result_fills_empty_text() {
        let mut acc = ResponseAccumulator::new();
        let step = acc.apply(
            parse_line(r#"{"type":"result","is_error":false,"result":"final"}"#)
                .unwrap()
                .unwrap(),
        );
        assert_eq!(step, StreamStep::Finished(Ok(())));
        assert_eq!(acc.text(), "final");

        let mut acc = ResponseAccumulator::new();
        acc.apply(text_event("streamed"));
        acc.apply(StreamEvent::Result {
            subtype: None,
            is_error: false,
            result: Some("final".to_string()),
        });
        assert_eq!(acc.text(), "streamed");
    }

    #[test]
    fn test_error_result_keeps_partial_text() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(text_event("partial"));
        let step = acc.apply(StreamEvent::Result {
            subtype: Some("error_during_execution".to_string()),
            is_error: true,
            result: Some("rate limited".to_string()),
        });

        assert_eq!(step, StreamStep::Finished(Err("rate limited".to_string())));
        assert_eq!(acc.text(), "partial");
    }

    #[test]
    fn test_housekeeping_ignored() {
        let mut acc = ResponseAccumulator::new();
        assert_eq!(
            acc.apply(StreamEvent::System { subtype: None }),
            StreamStep::Ignored
        );
        assert_eq!(acc.apply(StreamEvent::User {}), StreamStep::Ignored);
        assert!(acc.is_empty());
    }
}
