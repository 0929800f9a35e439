//! `agentpane complete`: one inline suggestion, printed to stdout.

use crate::bootstrap::AppContext;
use agentpane_application::{CompletionProvider, CompletionRequest};
use agentpane_core::config::CompletionSettings;
use anyhow::{Context, Result, bail};
use std::path::Path;

pub async fn run(
    ctx: &AppContext,
    file: &Path,
    line: u32,
    column: u32,
    language: Option<String>,
) -> Result<()> {
    if line == 0 || column == 0 {
        bail!("Line and column are one-based");
    }
    if !ctx.settings.completion.enabled {
        tracing::info!("Inline completion is disabled in config.toml");
        return Ok(());
    }

    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let language = language.or_else(|| {
        file.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string)
    });

    // Nothing to debounce for a one-shot request.
    let settings = CompletionSettings {
        debounce_ms: 0,
        ..ctx.settings.completion.clone()
    };
    let provider = CompletionProvider::new(
        ctx.agent(),
        settings,
        ctx.workspace_root
            .as_ref()
            .map(|dir| dir.display().to_string()),
    );

    let suggestion = provider
        .provide(CompletionRequest {
            uri: file.display().to_string(),
            line: line - 1,
            character: column - 1,
            text,
            language,
        })
        .await;

    match suggestion {
        Some(suggestion) => println!("{}", suggestion),
        None => tracing::info!("No suggestion"),
    }
    Ok(())
}
