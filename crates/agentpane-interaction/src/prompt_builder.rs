//! Flattens an [`AgentRequest`] into the single prompt string passed to `-p`.

use agentpane_core::agent::{AgentRequest, FileSnippet};
use agentpane_core::conversation::MessageRole;
use std::fmt::Write;

/// Marks the cursor inside a file snippet.
pub const CURSOR_MARKER: &str = "<CURSOR>";

/// Builds the prompt: instructions, workspace, conversation, file snippet,
/// then the request itself. Empty sections are left out.
pub fn build_prompt(request: &AgentRequest) -> String {
    let mut sections: Vec<String> = Vec::new();
    let context = &request.context;

    if let Some(instructions) = context.instructions.as_deref().map(str::trim) {
        if !instructions.is_empty() {
            sections.push(instructions.to_string());
        }
    }

    if let Some(root) = &context.workspace_root {
        sections.push(format!(
            "Workspace: {}\nOnly read or modify files inside this directory.",
            root
        ));
    }

    if !context.conversation.is_empty() {
        let mut history = String::from("Conversation so far:");
        for message in &context.conversation {
            let speaker = match message.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
            };
            let _ = write!(history, "\n{}: {}", speaker, message.content.trim_end());
        }
        sections.push(history);
    }

    if let Some(file) = &context.file {
        sections.push(file_section(file, request.language.as_deref()));
    }

    sections.push(request.prompt.trim().to_string());
    sections.join("\n\n")
}

fn file_section(file: &FileSnippet, language: Option<&str>) -> String {
    let mut header = format!(
        "File: {} (line {}, column {})",
        file.path,
        file.line + 1,
        file.character + 1
    );
    if let Some(language) = language {
        let _ = write!(header, " [{}]", language);
    }
    format!(
        "{}\n```{}\n{}{}{}\n```",
        header,
        language.unwrap_or_default(),
        file.before_cursor,
        CURSOR_MARKER,
        file.after_cursor
    )
}
