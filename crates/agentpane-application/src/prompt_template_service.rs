//! Prompt template management and rendering.
//!
//! The service enforces what the repository doesn't: at most
//! [`MAX_TEMPLATES`] templates, names unique ignoring case, and at most one
//! active template. Templates are minijinja sources rendered with the
//! variables `prompt`, `language`, `workspace` and `file`.

use agentpane_core::prompt_template::{
    MAX_TEMPLATES, PromptTemplate, PromptTemplateRepository, SavePromptTemplateRequest,
};
use agentpane_core::{AgentPaneError, Result};
use minijinja::{Environment, context};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars<'a> {
    pub prompt: &'a str,
    pub language: Option<&'a str>,
    pub workspace: Option<&'a str>,
    pub file: Option<&'a str>,
}

pub struct PromptTemplateService {
    repository: Arc<dyn PromptTemplateRepository>,
    /// Serializes check-then-write sequences.
    write_lock: Mutex<()>,
}

impl PromptTemplateService {
    pub fn new(repository: Arc<dyn PromptTemplateRepository>) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
        }
    }

    /// All templates, oldest first.
    pub async fn list(&self) -> Result<Vec<PromptTemplate>> {
        self.repository.list().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<PromptTemplate>> {
        self.repository.get(id).await
    }

    pub async fn active(&self) -> Result<Option<PromptTemplate>> {
        Ok(self.list().await?.into_iter().find(|t| t.is_active))
    }

    /// Creates a template, or edits one when `request.id` is set.
    ///
    /// Rejections (empty fields, bad syntax, duplicate name, full store,
    /// unknown id) leave stored state untouched.
    pub async fn save(&self, request: SavePromptTemplateRequest) -> Result<PromptTemplate> {
        request.validate()?;
        check_syntax(&request.template)?;

        let _guard = self.write_lock.lock().await;
        let existing = self.repository.list().await?;

        let editing = match &request.id {
            Some(id) => Some(
                existing
                    .iter()
                    .find(|t| &t.id == id)
                    .cloned()
                    .ok_or_else(|| AgentPaneError::not_found("prompt template", id.clone()))?,
            ),
            None => None,
        };

        let name_taken = existing
            .iter()
            .filter(|t| editing.as_ref().is_none_or(|e| e.id != t.id))
            .any(|t| t.has_name(&request.name));
        if name_taken {
            return Err(AgentPaneError::duplicate(
                "prompt template",
                request.name.trim(),
            ));
        }

        let template = match editing {
            Some(current) => request.apply_to(&current),
            None => {
                if existing.len() >= MAX_TEMPLATES {
                    return Err(AgentPaneError::LimitExceeded {
                        entity_type: "prompt templates",
                        limit: MAX_TEMPLATES,
                    });
                }
                request.into_template()
            }
        };

        self.repository.save(&template).await?;
        tracing::info!("Saved prompt template '{}' ({})", template.name, template.id);
        Ok(template)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.repository.delete(id).await?;
        tracing::info!("Deleted prompt template {}", id);
        Ok(())
    }

    /// Makes `id` the only active template; `None` deactivates all.
    pub async fn activate(&self, id: Option<&str>) -> Result<Vec<PromptTemplate>> {
        let _guard = self.write_lock.lock().await;
        let mut templates = self.repository.list().await?;

        if let Some(id) = id {
            if !templates.iter().any(|t| t.id == id) {
                return Err(AgentPaneError::not_found("prompt template", id));
            }
        }

        for template in templates.iter_mut() {
            let should_be_active = Some(template.id.as_str()) == id;
            if template.is_active != should_be_active {
                template.is_active = should_be_active;
                self.repository.save(template).await?;
            }
        }
        Ok(templates)
    }

    /// Renders the active template, `None` when no template is active.
    ///
    /// A template that fails to render is logged and skipped.
    pub async fn render_active(&self, vars: &TemplateVars<'_>) -> Option<String> {
        let active = match self.active().await {
            Ok(active) => active?,
            Err(e) => {
                tracing::warn!("Failed to read prompt templates: {}", e);
                return None;
            }
        };

        match render(&active, vars) {
            Ok(rendered) => Some(rendered),
            Err(e) => {
                tracing::warn!("Prompt template '{}' failed to render: {}", active.name, e);
                None
            }
        }
    }
}

/// Renders `template` with `vars`.
pub fn render(template: &PromptTemplate, vars: &TemplateVars<'_>) -> Result<String> {
    let env = Environment::new();
    env.render_str(
        &template.template,
        context! {
            prompt => vars.prompt,
            language => vars.language,
            workspace => vars.workspace,
            file => vars.file,
        },
    )
    .map_err(|e| AgentPaneError::validation(format!("template error: {}", e)))
}

fn check_syntax(source: &str) -> Result<()> {
    let env = Environment::new();
    env.template_from_str(source)
        .map(|_| ())
        .map_err(|e| AgentPaneError::validation(format!("template syntax error: {}", e)))
}
