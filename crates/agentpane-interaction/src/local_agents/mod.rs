//! Agents backed by locally installed CLIs.

pub mod claude_code;

pub use claude_code::ClaudeCodeAgent;
