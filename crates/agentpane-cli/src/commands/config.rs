use crate::bootstrap::AppContext;
use anyhow::{Context, Result};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a config.toml with default values if none exists
    Init,
    /// Print the effective settings
    Show,
    /// Print where config and data live
    Path,
}

pub fn run(ctx: &AppContext, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            if ctx.config.init()? {
                println!("Created {}", ctx.config.path().display());
            } else {
                println!("{} already exists", ctx.config.path().display());
            }
        }
        ConfigAction::Show => {
            let rendered =
                toml::to_string_pretty(&ctx.settings).context("Failed to render settings")?;
            print!("{}", rendered);
        }
        ConfigAction::Path => {
            println!("config:    {}", ctx.config.path().display());
            println!("storage:   {}", ctx.paths.storage_dir().display());
            println!("logs:      {}", ctx.paths.logs_dir().display());
            println!("mcp:       {}", ctx.paths.claude_config_file().display());
        }
    }
    Ok(())
}
