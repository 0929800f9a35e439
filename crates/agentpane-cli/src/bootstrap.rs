//! Startup wiring: logging, paths, settings and services.

use crate::panel_log::PanelLogLayer;
use agentpane_application::{
    ChatController, CompletionProvider, ConversationService, McpService, PromptTemplateService,
};
use agentpane_core::config::Settings;
use agentpane_core::protocol::PanelMessage;
use agentpane_infrastructure::{
    AgentPanePaths, ConfigService, JsonConversationRepository, JsonMcpRepository,
    JsonPromptTemplateRepository,
};
use agentpane_interaction::ClaudeCodeAgent;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "AGENTPANE_LOG";

/// Installs the global subscriber: stderr, a daily log file, and the panel
/// when `panel` is given.
///
/// The returned guard flushes the file writer on drop.
pub fn init_logging(
    paths: &AgentPanePaths,
    panel: Option<UnboundedSender<PanelMessage>>,
) -> Result<WorkerGuard> {
    let logs_dir = paths.logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&logs_dir, "agentpane.log"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .with(panel.map(PanelLogLayer::new))
        .try_init()
        .context("Failed to install the log subscriber")?;

    Ok(guard)
}

/// Everything a command needs, resolved once at startup.
pub struct AppContext {
    pub paths: AgentPanePaths,
    pub config: ConfigService,
    pub settings: Settings,
    pub workspace_root: Option<PathBuf>,
}

impl AppContext {
    pub fn load(paths: AgentPanePaths, workspace: Option<PathBuf>) -> Result<Self> {
        let config = ConfigService::new(paths.config_file());
        let settings = config
            .settings()
            .with_context(|| format!("Failed to load {}", config.path().display()))?;

        let workspace_root = match workspace {
            Some(dir) => Some(dir),
            None => std::env::current_dir().ok(),
        };

        Ok(Self {
            paths,
            config,
            settings,
            workspace_root,
        })
    }

    fn workspace_string(&self) -> Option<String> {
        self.workspace_root
            .as_ref()
            .map(|dir| dir.display().to_string())
    }

    pub fn agent(&self) -> Arc<ClaudeCodeAgent> {
        Arc::new(ClaudeCodeAgent::from_settings(
            &self.settings.agent,
            self.workspace_root.clone(),
        ))
    }

    pub async fn conversations(&self) -> Result<Arc<ConversationService>> {
        let dir = self.paths.conversations_dir();
        let repository = JsonConversationRepository::new(&dir)
            .await
            .with_context(|| format!("Failed to open conversation store {}", dir.display()))?;
        Ok(Arc::new(ConversationService::new(
            Arc::new(repository),
            self.workspace_string(),
        )))
    }

    pub fn mcp(&self) -> Arc<McpService> {
        Arc::new(McpService::new(Arc::new(JsonMcpRepository::new(
            self.paths.claude_config_file(),
        ))))
    }

    pub async fn templates(&self) -> Result<Arc<PromptTemplateService>> {
        let dir = self.paths.prompt_templates_dir();
        let repository = JsonPromptTemplateRepository::new(&dir)
            .await
            .with_context(|| format!("Failed to open template store {}", dir.display()))?;
        Ok(Arc::new(PromptTemplateService::new(Arc::new(repository))))
    }

    pub async fn controller(
        &self,
        outbox: UnboundedSender<PanelMessage>,
    ) -> Result<Arc<ChatController>> {
        let agent = self.agent();
        let completions = CompletionProvider::new(
            agent.clone(),
            self.settings.completion.clone(),
            self.workspace_string(),
        );
        let controller = ChatController::new(
            self.conversations().await?,
            agent,
            self.mcp(),
            self.templates().await?,
            outbox,
        )
        .with_history_messages(self.settings.agent.history_messages)
        .with_completions(Arc::new(completions));
        Ok(Arc::new(controller))
    }
}
