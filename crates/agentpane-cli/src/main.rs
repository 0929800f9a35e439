use agentpane_infrastructure::AgentPanePaths;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bootstrap;
mod commands;
mod panel_log;

use bootstrap::AppContext;

#[derive(Parser)]
#[command(name = "agentpane")]
#[command(about = "agentpane - chat and inline completion backed by a coding agent", long_about = None)]
struct Cli {
    /// Storage and config directory (overrides AGENTPANE_HOME)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Workspace the agent works in (defaults to the current directory)
    #[arg(long, short = 'w', global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Speak the panel protocol as JSON lines over stdin/stdout
    Serve,
    /// Send one chat message and stream the reply
    Ask {
        /// Message text; read from stdin when omitted
        text: Vec<String>,
    },
    /// Suggest code for a cursor position in a file
    Complete {
        file: PathBuf,
        /// One-based line number
        line: u32,
        /// One-based column
        column: u32,
        #[arg(long)]
        language: Option<String>,
    },
    /// Manage stored conversations
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Manage MCP server definitions
    Mcp {
        #[command(subcommand)]
        action: commands::mcp::McpAction,
    },
    /// Manage prompt templates
    Templates {
        #[command(subcommand)]
        action: commands::templates::TemplateAction,
    },
    /// Inspect or create config.toml
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = AgentPanePaths::new(cli.home.clone()).context("Failed to resolve data directories")?;

    // `serve` forwards warnings to the panel, so it owns the outbox from the start.
    let (outbox, inbox) = tokio::sync::mpsc::unbounded_channel();
    let panel = matches!(cli.command, Commands::Serve).then(|| outbox.clone());
    let _log_guard = bootstrap::init_logging(&paths, panel)?;

    let ctx = AppContext::load(paths, cli.workspace)?;
    tracing::debug!("Using config {}", ctx.config.path().display());

    match cli.command {
        Commands::Serve => commands::serve::run(&ctx, outbox, inbox).await,
        Commands::Ask { text } => commands::ask::run(&ctx, text).await,
        Commands::Complete {
            file,
            line,
            column,
            language,
        } => commands::complete::run(&ctx, &file, line, column, language).await,
        Commands::History { action } => commands::history::run(&ctx, action).await,
        Commands::Mcp { action } => commands::mcp::run(&ctx, action).await,
        Commands::Templates { action } => commands::templates::run(&ctx, action).await,
        Commands::Config { action } => commands::config::run(&ctx, action),
    }
}
