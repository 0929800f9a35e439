//! Coding-agent integration: prompt assembly, stream-json parsing and the
//! `claude` CLI client.

pub mod accumulator;
pub mod local_agents;
pub mod prompt_builder;
pub mod stream;

pub use accumulator::{ResponseAccumulator, StreamStep, summarize_tool_use};
pub use local_agents::ClaudeCodeAgent;
pub use prompt_builder::build_prompt;
