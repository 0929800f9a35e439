//! ClaudeCodeAgent - an AgentClient that drives the `claude` CLI.
//!
//! Each request spawns `claude -p <prompt> --output-format stream-json`,
//! folds the event stream into one response string, and reports every
//! increment to the caller. A timer and the caller's token share one
//! cancellation token; cancelling it kills the child process.

use crate::accumulator::{ResponseAccumulator, StreamStep};
use crate::prompt_builder::build_prompt;
use crate::stream::parse_line;
use agentpane_core::agent::{AgentClient, AgentRequest, AgentResponse, UpdateCallback};
use agentpane_core::config::{
    AgentSettings, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS, PermissionMode, ThinkingMode,
};
use agentpane_core::{AgentPaneError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

const DEFAULT_CLAUDE_COMMAND: &str = "claude";
const THINKING_TOKENS_ENV: &str = "MAX_THINKING_TOKENS";

/// How reading the event stream ended.
enum StreamEnd {
    Finished(std::result::Result<(), String>),
    Eof,
    Aborted,
    ReadFailed(String),
}

/// An agent client backed by the Claude CLI.
#[derive(Debug, Clone)]
pub struct ClaudeCodeAgent {
    /// Path to the `claude` executable. If None, searches in PATH.
    claude_path: Option<PathBuf>,
    model: Option<String>,
    permission_mode: PermissionMode,
    thinking: ThinkingMode,
    allowed_tools: Vec<String>,
    timeout: Duration,
    /// Working directory used when a request carries no workspace root.
    pub workspace_root: Option<PathBuf>,
}

impl ClaudeCodeAgent {
    /// Creates an agent with default settings, searching PATH for `claude`.
    pub fn new(workspace_root: Option<PathBuf>) -> Self {
        Self::from_settings(&AgentSettings::default(), workspace_root)
    }

    /// Creates an agent configured from the `[agent]` settings table.
    pub fn from_settings(settings: &AgentSettings, workspace_root: Option<PathBuf>) -> Self {
        Self {
            claude_path: settings.claude_path.as_ref().map(PathBuf::from),
            model: Some(settings.model.clone()).filter(|m| !m.trim().is_empty()),
            permission_mode: settings.permission_mode,
            thinking: settings.thinking,
            allowed_tools: settings.allowed_tools.clone(),
            timeout: Duration::from_secs(settings.effective_timeout_secs()),
            workspace_root,
        }
    }

    /// Sets a custom path to the claude executable.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.claude_path = Some(path);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    pub fn with_allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = tools;
        self
    }

    /// Sets the wall-clock timeout, clamped to the supported range.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn claude_command(&self) -> String {
        self.claude_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_CLAUDE_COMMAND.to_string())
    }

    /// Command-line arguments for one prompt.
    pub fn command_args(&self, prompt: &str) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            prompt.to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];
        if !self.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(self.allowed_tools.join(","));
        }
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.push("--permission-mode".to_string());
        args.push(self.permission_mode.to_string());
        args
    }

    fn build_command(&self, prompt: &str, workspace_root: Option<PathBuf>) -> Command {
        let mut cmd = Command::new(self.claude_command());
        cmd.args(self.command_args(prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(root) = workspace_root.or_else(|| self.workspace_root.clone()) {
            cmd.current_dir(root);
        }

        if let Some(budget) = self.thinking.token_budget() {
            cmd.env(THINKING_TOKENS_ENV, budget.to_string());
            log::debug!("Thinking budget: {} tokens", budget);
        }

        // macOS app bundles don't inherit the login shell PATH
        #[cfg(target_os = "macos")]
        {
            if let Some(path) = enhanced_path() {
                cmd.env("PATH", path);
            }
        }

        cmd
    }

    async fn check_available(&self) -> Result<()> {
        if let Some(path) = &self.claude_path {
            return if tokio::fs::metadata(path).await.is_ok() {
                Ok(())
            } else {
                Err(AgentPaneError::agent(format!(
                    "claude executable not found at {}",
                    path.display()
                )))
            };
        }

        #[cfg(unix)]
        let check_cmd = "which";
        #[cfg(windows)]
        let check_cmd = "where";

        let output = Command::new(check_cmd)
            .arg(DEFAULT_CLAUDE_COMMAND)
            .output()
            .await
            .map_err(|e| AgentPaneError::agent(format!("Failed to check claude availability: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(AgentPaneError::agent(
                "claude CLI not found in PATH. Please install Claude CLI.",
            ))
        }
    }

    /// Reads events until the stream ends or `token` is cancelled.
    async fn read_events(
        child: &mut Child,
        accumulator: &mut ResponseAccumulator,
        on_update: Option<UpdateCallback<'_>>,
        token: &CancellationToken,
    ) -> StreamEnd {
        let Some(stdout) = child.stdout.take() else {
            return StreamEnd::ReadFailed("claude stdout was not captured".to_string());
        };
        let mut lines = BufReader::new(stdout).lines();

        loop {
            tokio::select! {
                _ = token.cancelled() => return StreamEnd::Aborted,
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => return StreamEnd::Eof,
                        Err(e) => return StreamEnd::ReadFailed(e.to_string()),
                    };

                    let event = match parse_line(&line) {
                        Ok(Some(event)) => event,
                        Ok(None) => continue,
                        Err(e) => {
                            log::debug!("Skipping non-JSON output line ({}): {}", e, line);
                            continue;
                        }
                    };

                    match accumulator.apply(event) {
                        StreamStep::Updated => {
                            if let Some(callback) = on_update {
                                callback(accumulator.text());
                            }
                        }
                        StreamStep::Ignored => {}
                        StreamStep::Finished(result) => return StreamEnd::Finished(result),
                    }
                }
            }
        }
    }
}

impl Default for ClaudeCodeAgent {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl AgentClient for ClaudeCodeAgent {
    async fn complete(
        &self,
        request: &AgentRequest,
        on_update: Option<UpdateCallback<'_>>,
        cancel: CancellationToken,
    ) -> AgentResponse {
        if cancel.is_cancelled() {
            log::debug!("Request cancelled before claude was started");
            return AgentResponse::failed("", "Request cancelled");
        }

        let prompt = build_prompt(request);
        let workspace_root = request.context.workspace_root.as_ref().map(PathBuf::from);

        log::info!("ClaudeCodeAgent executing...");
        log::debug!("Prompt length: {} chars", prompt.len());
        log::trace!("Full prompt: {}", prompt);

        let mut child = match self.build_command(&prompt, workspace_root).spawn() {
            Ok(child) => child,
            Err(e) => {
                log::error!("Failed to spawn claude process: {}", e);
                return AgentResponse::failed(
                    "",
                    format!(
                        "Failed to spawn claude process: {}. \
                         Make sure 'claude' CLI is installed and in PATH, \
                         or set agent.claude_path in config.toml.",
                        e
                    ),
                );
            }
        };

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        // The timer and the caller share this token.
        let call_token = cancel.child_token();
        let timeout = self.timeout;
        let timer_token = call_token.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    timer_token.cancel();
                    true
                }
                _ = timer_token.cancelled() => false,
            }
        });

        let mut accumulator = ResponseAccumulator::new();
        let end = Self::read_events(&mut child, &mut accumulator, on_update, &call_token).await;

        call_token.cancel();
        let timed_out = timer.await.unwrap_or(false);

        let response = match end {
            StreamEnd::Finished(Ok(())) => {
                log::info!("ClaudeCodeAgent completed");
                AgentResponse::ok(accumulator.into_text())
            }
            StreamEnd::Finished(Err(message)) => {
                log::warn!("claude reported an error: {}", message);
                AgentResponse::failed(accumulator.into_text(), message)
            }
            StreamEnd::Aborted => {
                let _ = child.kill().await;
                let message = if timed_out {
                    AgentPaneError::Timeout(timeout.as_secs()).to_string()
                } else {
                    "Request cancelled".to_string()
                };
                log::warn!("ClaudeCodeAgent aborted: {}", message);
                AgentResponse::failed(accumulator.into_text(), message)
            }
            StreamEnd::ReadFailed(e) => {
                let _ = child.kill().await;
                log::error!("Failed to read claude output: {}", e);
                AgentResponse::failed(
                    accumulator.into_text(),
                    format!("Failed to read claude output: {}", e),
                )
            }
            StreamEnd::Eof => {
                let status = child.wait().await;
                let stderr = match stderr_task {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                };
                match status {
                    Ok(status) if status.success() => {
                        log::warn!("claude exited without a result message");
                        AgentResponse::ok(accumulator.into_text())
                    }
                    Ok(status) => {
                        let stderr = stderr.trim();
                        log::error!("Claude command failed with status {}: {}", status, stderr);
                        let message = if stderr.is_empty() {
                            format!("Claude command failed with status {}", status)
                        } else {
                            stderr.to_string()
                        };
                        AgentResponse::failed(accumulator.into_text(), message)
                    }
                    Err(e) => AgentResponse::failed(
                        accumulator.into_text(),
                        format!("Failed to wait for claude process: {}", e),
                    ),
                }
            }
        };

        log::debug!("Response length: {} chars", response.suggestion.len());
        response
    }

    fn name(&self) -> String {
        "ClaudeCodeAgent".to_string()
    }

    async fn is_available(&self) -> Result<()> {
        self.check_available().await
    }
}

#[cfg(target_os = "macos")]
fn enhanced_path() -> Option<String> {
    let current_path = std::env::var("PATH").ok()?;
    let home_dir = std::env::var("HOME").unwrap_or_default();

    let local_bin = format!("{}/.local/bin", home_dir);
    let home_bin = format!("{}/bin", home_dir);
    let volta_bin = format!("{}/.volta/bin", home_dir);
    let additional_paths = [
        "/usr/local/bin",
        "/opt/homebrew/bin",
        local_bin.as_str(),
        home_bin.as_str(),
        volta_bin.as_str(),
    ];

    let mut new_path = current_path;
    for path in additional_paths {
        if !new_path.split(':').any(|p| p == path) {
            new_path = format!("{}:{}", new_path, path);
        }
    }
    Some(new_path)
}
