//! User-settable options, stored in `config.toml`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lower bound for the agent wall-clock timeout.
pub const MIN_TIMEOUT_SECS: u64 = 120;
/// Upper bound (and default) for the agent wall-clock timeout.
pub const MAX_TIMEOUT_SECS: u64 = 180;

/// Tool permission mode handed to the agent CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PermissionMode {
    #[default]
    #[serde(rename = "default")]
    #[strum(serialize = "default")]
    Default,
    #[serde(rename = "acceptEdits")]
    #[strum(serialize = "acceptEdits")]
    AcceptEdits,
    #[serde(rename = "bypassPermissions")]
    #[strum(serialize = "bypassPermissions")]
    BypassPermissions,
    #[serde(rename = "plan")]
    #[strum(serialize = "plan")]
    Plan,
}

/// How much extended thinking the agent may spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThinkingMode {
    #[default]
    Off,
    Normal,
    Verbose,
}

impl ThinkingMode {
    /// Thinking token budget, `None` when thinking is off.
    pub fn token_budget(&self) -> Option<u32> {
        match self {
            ThinkingMode::Off => None,
            ThinkingMode::Normal => Some(8_000),
            ThinkingMode::Verbose => Some(31_999),
        }
    }
}

/// Inline completion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub enabled: bool,
    /// Quiet period after the last keystroke before a request is sent.
    pub debounce_ms: u64,
    /// Lines of file context taken before and after the cursor.
    pub context_lines: usize,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 300,
            context_lines: 50,
        }
    }
}

/// Coding agent options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub model: String,
    pub permission_mode: PermissionMode,
    pub thinking: ThinkingMode,
    pub timeout_secs: u64,
    pub allowed_tools: Vec<String>,
    /// Path to the `claude` executable. If None, searches in PATH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_path: Option<String>,
    /// Number of previous messages sent along with a chat prompt.
    pub history_messages: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "sonnet".to_string(),
            permission_mode: PermissionMode::Default,
            thinking: ThinkingMode::Off,
            timeout_secs: MAX_TIMEOUT_SECS,
            allowed_tools: ["Read", "Grep", "Glob", "LS"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            claude_path: None,
            history_messages: 10,
        }
    }
}

impl AgentSettings {
    /// The configured timeout clamped to the supported range.
    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
    }
}

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub completion: CompletionSettings,
    pub agent: AgentSettings,
}
