use crate::bootstrap::AppContext;
use agentpane_core::prompt_template::SavePromptTemplateRequest;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum TemplateAction {
    /// List templates
    List,
    /// Create a template, or edit one with --id
    Save {
        name: String,
        /// Template source, e.g. "Review: {{ prompt }}"
        #[arg(long, required_unless_present = "file")]
        template: Option<String>,
        /// Read the template source from a file
        #[arg(long, conflicts_with = "template")]
        file: Option<PathBuf>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "general")]
        category: String,
        /// Edit the template with this id
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a template
    Delete { id: String },
    /// Make a template the active one
    Activate { id: String },
    /// Deactivate all templates
    Deactivate,
}

pub async fn run(ctx: &AppContext, action: TemplateAction) -> Result<()> {
    let service = ctx.templates().await?;

    match action {
        TemplateAction::List => {
            let templates = service.list().await?;
            if templates.is_empty() {
                println!("No prompt templates.");
            }
            for template in templates {
                let marker = if template.is_active {
                    "*".green().bold()
                } else {
                    " ".normal()
                };
                println!(
                    "{} {}  {} [{}]",
                    marker,
                    template.id.dimmed(),
                    template.name.bold(),
                    template.category
                );
                if !template.description.is_empty() {
                    println!("    {}", template.description);
                }
            }
        }
        TemplateAction::Save {
            name,
            template,
            file,
            description,
            category,
            id,
        } => {
            let source = match (template, file) {
                (Some(source), _) => source,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => String::new(),
            };
            let saved = service
                .save(SavePromptTemplateRequest {
                    id,
                    name,
                    description,
                    category,
                    template: source,
                })
                .await?;
            println!("Saved template {} ({})", saved.name, saved.id);
        }
        TemplateAction::Delete { id } => {
            service.delete(&id).await?;
            println!("Deleted template {}", id);
        }
        TemplateAction::Activate { id } => {
            service.activate(Some(&id)).await?;
            println!("Activated template {}", id);
        }
        TemplateAction::Deactivate => {
            service.activate(None).await?;
            println!("No template is active");
        }
    }
    Ok(())
}
