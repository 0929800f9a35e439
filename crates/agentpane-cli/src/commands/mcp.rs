use crate::bootstrap::AppContext;
use agentpane_core::mcp::{McpServerConfig, McpServerType};
use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use colored::Colorize;

#[derive(Subcommand)]
pub enum McpAction {
    /// List configured servers
    List,
    /// Add a server; fails if the name is taken
    Add {
        name: String,
        /// Executable for a stdio server
        #[arg(required_unless_present = "url")]
        command: Option<String>,
        /// Arguments passed to the command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        /// Endpoint of an SSE server
        #[arg(long, conflicts_with = "command")]
        url: Option<String>,
        /// Environment entry KEY=VALUE (repeatable)
        #[arg(long = "env", short = 'e')]
        env: Vec<String>,
    },
    /// Remove a server
    Remove { name: String },
}

pub async fn run(ctx: &AppContext, action: McpAction) -> Result<()> {
    let service = ctx.mcp();

    match action {
        McpAction::List => {
            let servers = service.list().await?;
            if servers.is_empty() {
                println!("No MCP servers configured.");
            }
            for server in servers {
                let target = match server.server_type {
                    McpServerType::Stdio => {
                        format!("{} {}", server.command, server.args.join(" "))
                    }
                    McpServerType::Sse => server.url.clone().unwrap_or_default(),
                };
                println!(
                    "{}  [{}]  {}",
                    server.name.bold(),
                    server.server_type,
                    target.trim_end()
                );
            }
        }
        McpAction::Add {
            name,
            command,
            args,
            url,
            env,
        } => {
            let mut server = match (command, url) {
                (_, Some(url)) => McpServerConfig::sse(&name, url),
                (Some(command), None) => McpServerConfig::stdio(&name, command, args),
                (None, None) => return Err(anyhow!("Either a command or --url is required")),
            };
            for entry in env {
                let (key, value) = entry
                    .split_once('=')
                    .with_context(|| format!("Expected KEY=VALUE, got '{}'", entry))?;
                server = server.with_env(key, value);
            }
            service.add(server).await?;
            println!("Added MCP server {}", name);
        }
        McpAction::Remove { name } => {
            service.remove(&name).await?;
            println!("Removed MCP server {}", name);
        }
    }
    Ok(())
}
