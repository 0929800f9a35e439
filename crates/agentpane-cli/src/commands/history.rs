use crate::bootstrap::AppContext;
use agentpane_core::conversation::MessageRole;
use anyhow::{Result, bail};
use clap::Subcommand;
use colored::Colorize;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List stored conversations, most recent first
    List,
    /// Print a conversation
    Show { id: String },
    /// Delete a conversation
    Delete { id: String },
    /// Delete every stored conversation
    Clear,
}

pub async fn run(ctx: &AppContext, action: HistoryAction) -> Result<()> {
    let conversations = ctx.conversations().await?;

    match action {
        HistoryAction::List => {
            let list = conversations.list().await;
            if list.is_empty() {
                println!("No conversations yet.");
            }
            for entry in list {
                println!(
                    "{}  {}  {} ({} messages)",
                    entry.id.dimmed(),
                    entry.last_activity.format("%Y-%m-%d %H:%M"),
                    entry.title.bold(),
                    entry.message_count
                );
            }
        }
        HistoryAction::Show { id } => {
            let Some(conversation) = conversations.load(&id).await else {
                bail!("Conversation '{}' not found", id);
            };
            println!("{}", conversation.metadata.title.bold());
            for message in conversation.messages {
                let speaker = match message.role {
                    MessageRole::User => "You".cyan(),
                    MessageRole::Assistant => "Agent".green(),
                };
                println!("\n{} {}", speaker.bold(), message.timestamp.format("%H:%M").to_string().dimmed());
                println!("{}", message.content);
            }
        }
        HistoryAction::Delete { id } => {
            conversations.delete(&id).await;
            println!("Deleted conversation {}", id);
        }
        HistoryAction::Clear => {
            conversations.clear_all().await;
            println!("Cleared conversation history");
        }
    }
    Ok(())
}
