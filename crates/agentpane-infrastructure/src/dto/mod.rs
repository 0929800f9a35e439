//! Data Transfer Objects (DTOs) for persistence.
//!
//! These types describe documents whose shape is owned by someone else
//! (e.g. the claude CLI's `claude.json`) and convert them to domain types.

pub mod mcp;

pub use mcp::{McpServerEntryDto, put_servers_map, servers_from_document, take_servers_map};
