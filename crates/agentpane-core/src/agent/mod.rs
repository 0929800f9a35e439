//! Coding-agent client abstraction.
//!
//! The application layer talks to the external coding agent only through
//! [`AgentClient`]; the process-backed implementation lives in
//! `agentpane-interaction`.

mod client;
mod request;

pub use client::{AgentClient, UpdateCallback};
pub use request::{AgentContext, AgentRequest, AgentResponse, FileSnippet};
