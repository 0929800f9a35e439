//! Chat controller: turns panel messages into service calls and pushes the
//! resulting state back to the panel.
//!
//! One response streams at a time. A `sendMessage` that arrives while a
//! response is streaming is rejected with an error message and changes
//! nothing.
//!
//! The user message and the reply placeholder are appended before the
//! request task is spawned, so the exchange always lands in the
//! conversation that was active when the message was sent.

use crate::completion::CompletionProvider;
use crate::conversation_service::ConversationService;
use crate::mcp_service::McpService;
use crate::prompt_template_service::{PromptTemplateService, TemplateVars};
use agentpane_core::agent::{AgentClient, AgentContext, AgentRequest, AgentResponse, UpdateCallback};
use agentpane_core::conversation::ConversationMessage;
use agentpane_core::protocol::{ChatState, HostMessage, PanelMessage};
use agentpane_core::{AgentPaneError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default number of earlier messages sent along with a prompt.
pub const DEFAULT_HISTORY_MESSAGES: usize = 10;

#[derive(Debug)]
struct Runtime {
    state: ChatState,
    cancel: Option<CancellationToken>,
}

/// A sent message whose reply has not been streamed yet.
#[derive(Debug)]
struct Exchange {
    conversation_id: String,
    prompt: String,
    history: Vec<ConversationMessage>,
    placeholder: ConversationMessage,
}

pub struct ChatController {
    conversations: Arc<ConversationService>,
    agent: Arc<dyn AgentClient>,
    mcp: Arc<McpService>,
    templates: Arc<PromptTemplateService>,
    completions: Option<Arc<CompletionProvider>>,
    history_messages: usize,
    outbox: UnboundedSender<PanelMessage>,
    runtime: Mutex<Runtime>,
}

impl ChatController {
    pub fn new(
        conversations: Arc<ConversationService>,
        agent: Arc<dyn AgentClient>,
        mcp: Arc<McpService>,
        templates: Arc<PromptTemplateService>,
        outbox: UnboundedSender<PanelMessage>,
    ) -> Self {
        Self {
            conversations,
            agent,
            mcp,
            templates,
            completions: None,
            history_messages: DEFAULT_HISTORY_MESSAGES,
            outbox,
            runtime: Mutex::new(Runtime {
                state: ChatState::Idle,
                cancel: None,
            }),
        }
    }

    /// Sets how many earlier messages accompany each prompt.
    pub fn with_history_messages(mut self, count: usize) -> Self {
        self.history_messages = count;
        self
    }

    /// Serves `requestCompletion` through `provider`.
    pub fn with_completions(mut self, provider: Arc<CompletionProvider>) -> Self {
        self.completions = Some(provider);
        self
    }

    pub fn state(&self) -> ChatState {
        self.runtime().state
    }

    /// Handles one panel message.
    ///
    /// `sendMessage` and `requestCompletion` run in spawned tasks so that
    /// later messages are handled while they wait on the agent; the task
    /// handle is returned.
    pub async fn handle(self: &Arc<Self>, message: HostMessage) -> Option<JoinHandle<()>> {
        tracing::debug!("[ChatController] handling {:?}", message);

        match message {
            HostMessage::Ready => {
                self.emit_messages().await;
                self.emit_conversations().await;
                self.emit_templates().await;
                self.emit_mcp_servers().await;
                self.emit(PanelMessage::Status {
                    state: self.state(),
                });
            }
            HostMessage::SendMessage { text } => {
                let cancel = match self.begin_streaming(&text) {
                    Ok(cancel) => cancel,
                    Err(e) => {
                        self.emit(PanelMessage::error(e.to_string()));
                        return None;
                    }
                };
                let exchange = self.start_exchange(&text).await;
                let this = Arc::clone(self);
                return Some(tokio::spawn(async move {
                    this.stream_reply(exchange, &cancel).await;
                    this.finish_streaming();
                }));
            }
            HostMessage::RequestCompletion { request } => {
                let Some(provider) = self.completions.clone() else {
                    self.emit(PanelMessage::error("Inline completion is not available"));
                    return None;
                };
                let this = Arc::clone(self);
                return Some(tokio::spawn(async move {
                    let key = request.key();
                    let suggestion = provider.provide(request).await;
                    this.emit(PanelMessage::Completion { key, suggestion });
                }));
            }
            HostMessage::CancelRequest => self.cancel_in_flight(),
            HostMessage::ClearChat | HostMessage::NewConversation => {
                self.cancel_in_flight();
                self.conversations.start_new().await;
                self.emit_messages().await;
                self.emit_conversations().await;
            }
            HostMessage::LoadConversation { id } => {
                self.cancel_in_flight();
                if self.conversations.load(&id).await.is_none() {
                    self.emit(PanelMessage::error(format!(
                        "Conversation '{}' could not be loaded",
                        id
                    )));
                }
                self.emit_messages().await;
                self.emit_conversations().await;
            }
            HostMessage::DeleteConversation { id } => {
                if self.conversations.delete(&id).await {
                    self.emit_messages().await;
                }
                self.emit_conversations().await;
            }
            HostMessage::ListConversations => self.emit_conversations().await,
            HostMessage::ClearHistory => {
                self.cancel_in_flight();
                self.conversations.clear_all().await;
                self.emit_messages().await;
                self.emit_conversations().await;
            }
            HostMessage::InstallMcpServer { server } => {
                let result = self.mcp.add(server).await;
                self.after_mutation(result).await;
                self.emit_mcp_servers().await;
            }
            HostMessage::DeleteMcpServer { name } => {
                let result = self.mcp.remove(&name).await;
                self.after_mutation(result).await;
                self.emit_mcp_servers().await;
            }
            HostMessage::ListMcpServers => self.emit_mcp_servers().await,
            HostMessage::ListTemplates => self.emit_templates().await,
            HostMessage::SaveTemplate { template } => {
                let result = self.templates.save(template).await.map(|_| ());
                self.after_mutation(result).await;
                self.emit_templates().await;
            }
            HostMessage::DeleteTemplate { id } => {
                let result = self.templates.delete(&id).await;
                self.after_mutation(result).await;
                self.emit_templates().await;
            }
            HostMessage::ActivateTemplate { id } => {
                let result = self.templates.activate(id.as_deref()).await.map(|_| ());
                self.after_mutation(result).await;
                self.emit_templates().await;
            }
        }
        None
    }

    /// Sends a message and waits for the complete reply.
    pub async fn send_message(&self, text: &str) -> Result<ConversationMessage> {
        let cancel = self.begin_streaming(text)?;
        let exchange = self.start_exchange(text).await;
        let reply = self.stream_reply(exchange, &cancel).await;
        self.finish_streaming();
        Ok(reply)
    }

    /// Cancels the in-flight agent request, if any.
    pub fn cancel_in_flight(&self) {
        if let Some(cancel) = self.runtime().cancel.as_ref() {
            tracing::info!("[ChatController] cancelling in-flight request");
            cancel.cancel();
        }
    }

    fn begin_streaming(&self, text: &str) -> Result<CancellationToken> {
        if text.trim().is_empty() {
            return Err(AgentPaneError::validation("Message is empty"));
        }

        let cancel = {
            let mut runtime = self.runtime();
            if runtime.state == ChatState::Streaming {
                return Err(AgentPaneError::validation(
                    "A response is still streaming; cancel it or wait for it to finish",
                ));
            }
            let cancel = CancellationToken::new();
            runtime.state = ChatState::Streaming;
            runtime.cancel = Some(cancel.clone());
            cancel
        };

        self.emit(PanelMessage::Status {
            state: ChatState::Streaming,
        });
        Ok(cancel)
    }

    fn finish_streaming(&self) {
        {
            let mut runtime = self.runtime();
            runtime.state = ChatState::Idle;
            runtime.cancel = None;
        }
        self.emit(PanelMessage::Status {
            state: ChatState::Idle,
        });
    }

    /// Appends the user message and an empty reply placeholder to the
    /// active conversation.
    async fn start_exchange(&self, text: &str) -> Exchange {
        let text = text.trim();
        let history = self.conversations.recent_messages(self.history_messages).await;
        let conversation_id = self.conversations.current_id().await;

        self.conversations
            .add_message(ConversationMessage::user(text))
            .await;
        let placeholder = self
            .conversations
            .add_message(ConversationMessage::streaming_placeholder())
            .await;
        self.emit_messages().await;

        Exchange {
            conversation_id,
            prompt: text.to_string(),
            history,
            placeholder,
        }
    }

    /// Streams the agent reply into the exchange placeholder and completes
    /// it exactly once.
    ///
    /// Partial text is stored as it arrives, so a panel that reloads
    /// mid-stream sees what has been received so far.
    async fn stream_reply(
        &self,
        exchange: Exchange,
        cancel: &CancellationToken,
    ) -> ConversationMessage {
        let Exchange {
            conversation_id,
            prompt: text,
            history,
            placeholder,
        } = exchange;

        let workspace_root = self.conversations.workspace_root().map(str::to_string);
        let prompt = self
            .templates
            .render_active(&TemplateVars {
                prompt: &text,
                workspace: workspace_root.as_deref(),
                ..Default::default()
            })
            .await
            .unwrap_or_else(|| text.clone());
        let request = AgentRequest::new(prompt).with_context(AgentContext {
            conversation: history,
            workspace_root,
            ..Default::default()
        });

        let (progress_tx, mut progress_rx) = unbounded_channel::<String>();
        let progress_writer = {
            let conversations = Arc::clone(&self.conversations);
            let conversation_id = conversation_id.clone();
            let message_id = placeholder.id.clone();
            tokio::spawn(async move {
                while let Some(mut content) = progress_rx.recv().await {
                    // Only the newest text matters.
                    while let Ok(newer) = progress_rx.try_recv() {
                        content = newer;
                    }
                    if let Err(e) = conversations
                        .update_message(&conversation_id, &message_id, content, false)
                        .await
                    {
                        tracing::warn!("[ChatController] could not store partial reply: {}", e);
                    }
                }
            })
        };

        tracing::info!("[ChatController] sending prompt to {}", self.agent.name());
        let response = {
            let outbox = self.outbox.clone();
            let message_id = placeholder.id.clone();
            let on_update = move |content: &str| {
                let _ = progress_tx.send(content.to_string());
                let _ = outbox.send(PanelMessage::StreamingUpdate {
                    message_id: message_id.clone(),
                    content: content.to_string(),
                    is_complete: false,
                });
            };
            let on_update: UpdateCallback<'_> = &on_update;
            self.agent
                .complete(&request, Some(on_update), cancel.clone())
                .await
        };
        // The callback owned the sender; the writer stops once it has
        // stored the last partial text.
        if let Err(e) = progress_writer.await {
            tracing::warn!("[ChatController] partial reply writer failed: {}", e);
        }
        let content = reply_content(&response);

        let reply = match self
            .conversations
            .update_message(&conversation_id, &placeholder.id, content.clone(), true)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("[ChatController] could not store reply: {}", e);
                ConversationMessage {
                    content: content.clone(),
                    is_complete: true,
                    ..placeholder
                }
            }
        };

        self.emit(PanelMessage::StreamingUpdate {
            message_id: reply.id.clone(),
            content,
            is_complete: true,
        });
        self.emit_messages().await;
        reply
    }

    async fn after_mutation(&self, result: Result<()>) {
        if let Err(e) = result {
            if e.is_rejection() {
                tracing::info!("[ChatController] request rejected: {}", e);
            } else {
                tracing::warn!("[ChatController] request failed: {}", e);
            }
            self.emit(PanelMessage::error(e.to_string()));
        }
    }

    async fn emit_messages(&self) {
        let conversation = self.conversations.current().await;
        self.emit(PanelMessage::UpdateMessages {
            conversation_id: conversation.metadata.id,
            messages: conversation.messages,
        });
    }

    async fn emit_conversations(&self) {
        self.emit(PanelMessage::ConversationList {
            conversations: self.conversations.list().await,
        });
    }

    async fn emit_templates(&self) {
        match self.templates.list().await {
            Ok(templates) => self.emit(PanelMessage::Templates { templates }),
            Err(e) => self.emit(PanelMessage::error(format!(
                "Failed to load templates: {}",
                e
            ))),
        }
    }

    async fn emit_mcp_servers(&self) {
        match self.mcp.list().await {
            Ok(servers) => self.emit(PanelMessage::McpServers { servers }),
            Err(e) => self.emit(PanelMessage::error(format!(
                "Failed to load MCP servers: {}",
                e
            ))),
        }
    }

    fn emit(&self, message: PanelMessage) {
        if self.outbox.send(message).is_err() {
            tracing::debug!("[ChatController] panel channel closed");
        }
    }

    fn runtime(&self) -> std::sync::MutexGuard<'_, Runtime> {
        self.runtime.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Final message text: the reply, or the error below any partial reply.
fn reply_content(response: &AgentResponse) -> String {
    match &response.error {
        None => response.suggestion.clone(),
        Some(error) if response.suggestion.trim().is_empty() => format!("Error: {}", error),
        Some(error) => format!("{}\n\nError: {}", response.suggestion.trim_end(), error),
    }
}
