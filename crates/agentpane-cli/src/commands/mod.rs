pub mod ask;
pub mod complete;
pub mod config;
pub mod history;
pub mod mcp;
pub mod serve;
pub mod templates;
