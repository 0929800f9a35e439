//! Reusable prompt templates.
//!
//! The collection is capped at [`MAX_TEMPLATES`] entries and names are
//! unique (case-insensitive). At most one template is active; its text
//! wraps every chat prompt.

pub mod model;
pub mod repository;
pub mod request;

pub use model::{MAX_TEMPLATES, PromptTemplate};
pub use repository::PromptTemplateRepository;
pub use request::SavePromptTemplateRequest;
