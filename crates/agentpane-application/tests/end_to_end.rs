use agentpane_application::{
    ChatController, CompletionProvider, CompletionRequest, ConversationService, McpService,
    PromptTemplateService,
};
use agentpane_core::agent::{AgentClient, AgentRequest, AgentResponse, UpdateCallback};
use agentpane_core::config::CompletionSettings;
use agentpane_core::conversation::{
    ConversationMessage, ConversationRepository, MAX_INDEX_ENTRIES,
};
use agentpane_core::mcp::McpServerConfig;
use agentpane_core::prompt_template::{MAX_TEMPLATES, SavePromptTemplateRequest};
use agentpane_core::protocol::{HostMessage, PanelMessage};
use agentpane_core::{AgentPaneError, Result};
use agentpane_infrastructure::{
    JsonConversationRepository, JsonMcpRepository, JsonPromptTemplateRepository,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio_util::sync::CancellationToken;

/// Streams fixed chunks and counts calls.
struct ChunkAgent {
    chunks: Vec<&'static str>,
    calls: AtomicUsize,
}

impl ChunkAgent {
    fn new(chunks: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            chunks: chunks.to_vec(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentClient for ChunkAgent {
    async fn complete(
        &self,
        _request: &AgentRequest,
        on_update: Option<UpdateCallback<'_>>,
        _cancel: CancellationToken,
    ) -> AgentResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut text = String::new();
        for chunk in &self.chunks {
            text.push_str(chunk);
            if let Some(callback) = on_update {
                callback(&text);
            }
        }
        AgentResponse::ok(text)
    }

    fn name(&self) -> String {
        "ChunkAgent".to_string()
    }

    async fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

struct App {
    _dir: TempDir,
    controller: Arc<ChatController>,
    rx: UnboundedReceiver<PanelMessage>,
    conversations_dir: std::path::PathBuf,
    mcp_path: std::path::PathBuf,
    templates: Arc<PromptTemplateService>,
}

async fn app(agent: Arc<ChunkAgent>) -> App {
    let dir = TempDir::new().unwrap();
    let conversations_dir = dir.path().join("conversations");
    let mcp_path = dir.path().join("mcp.json");

    let conversations = Arc::new(ConversationService::new(
        Arc::new(JsonConversationRepository::new(&conversations_dir).await.unwrap()),
        Some(dir.path().display().to_string()),
    ));
    let mcp = Arc::new(McpService::new(Arc::new(JsonMcpRepository::new(&mcp_path))));
    let templates = Arc::new(PromptTemplateService::new(Arc::new(
        JsonPromptTemplateRepository::new(dir.path().join("templates"))
            .await
            .unwrap(),
    )));
    let (tx, rx) = unbounded_channel();
    let controller = Arc::new(ChatController::new(
        conversations,
        agent,
        mcp,
        templates.clone(),
        tx,
    ));

    App {
        _dir: dir,
        controller,
        rx,
        conversations_dir,
        mcp_path,
        templates,
    }
}

fn drain(rx: &mut UnboundedReceiver<PanelMessage>) -> Vec<PanelMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

fn template(name: &str) -> SavePromptTemplateRequest {
    SavePromptTemplateRequest {
        id: None,
        name: name.to_string(),
        description: String::new(),
        category: "general".to_string(),
        template: "{{ prompt }}".to_string(),
    }
}

#[tokio::test]
async fn test_streamed_reply_is_persisted_once_complete() {
    let mut app = app(ChunkAgent::new(&["A", "B", "C"])).await;

    let task = app
        .controller
        .handle(HostMessage::SendMessage {
            text: "hello".to_string(),
        })
        .await
        .expect("send is accepted");
    task.await.unwrap();

    let messages = drain(&mut app.rx);
    let completions: Vec<_> = messages
        .iter()
        .filter(|m| {
            matches!(
                m,
                PanelMessage::StreamingUpdate {
                    is_complete: true,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(completions.len(), 1, "exactly one completion: {:?}", messages);

    // A fresh repository sees what the controller wrote.
    let repository = JsonConversationRepository::new(&app.conversations_dir)
        .await
        .unwrap();
    let index = repository.list().await.unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].title, "hello");
    assert_eq!(index[0].message_count, 2);

    let stored = repository.find_by_id(&index[0].id).await.unwrap().unwrap();
    assert_eq!(stored.messages[1].content, "ABC");
    assert!(stored.messages[1].is_complete);
}

#[tokio::test]
async fn test_deleted_conversation_stays_deleted() {
    let mut app = app(ChunkAgent::new(&["ok"])).await;
    app.controller.send_message("first").await.unwrap();
    let id = {
        let repository = JsonConversationRepository::new(&app.conversations_dir)
            .await
            .unwrap();
        repository.list().await.unwrap()[0].id.clone()
    };
    drain(&mut app.rx);

    app.controller
        .handle(HostMessage::DeleteConversation { id: id.clone() })
        .await;
    app.controller.handle(HostMessage::ListConversations).await;

    let lists: Vec<_> = drain(&mut app.rx)
        .into_iter()
        .filter_map(|m| match m {
            PanelMessage::ConversationList { conversations } => Some(conversations),
            _ => None,
        })
        .collect();
    assert!(lists.iter().all(|list| list.iter().all(|c| c.id != id)));

    let repository = JsonConversationRepository::new(&app.conversations_dir)
        .await
        .unwrap();
    assert!(repository.list().await.unwrap().is_empty());
    assert!(repository.find_by_id(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_conversation_index_is_capped() {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(JsonConversationRepository::new(dir.path()).await.unwrap());
    let service = ConversationService::new(repository.clone(), None);

    for i in 0..MAX_INDEX_ENTRIES + 3 {
        service.start_new().await;
        service
            .add_message(ConversationMessage::user(format!("message {}", i)))
            .await;
    }

    let index = repository.list().await.unwrap();
    assert_eq!(index.len(), MAX_INDEX_ENTRIES);
    assert_eq!(index[0].id, service.current_id().await);
}

#[tokio::test]
async fn test_rejected_mcp_install_leaves_file_untouched() {
    let mut app = app(ChunkAgent::new(&[])).await;
    app.controller
        .handle(HostMessage::InstallMcpServer {
            server: McpServerConfig::stdio("fs", "npx", vec!["-y".to_string()]),
        })
        .await;
    let before = std::fs::read(&app.mcp_path).unwrap();

    app.controller
        .handle(HostMessage::InstallMcpServer {
            server: McpServerConfig::stdio("fs", "other", vec![]),
        })
        .await;
    app.controller
        .handle(HostMessage::InstallMcpServer {
            server: McpServerConfig::stdio("", "npx", vec![]),
        })
        .await;

    assert_eq!(std::fs::read(&app.mcp_path).unwrap(), before);
    let document: serde_json::Value = serde_json::from_slice(&before).unwrap();
    assert_eq!(document["mcpServers"]["fs"]["command"], "npx");

    let errors = drain(&mut app.rx)
        .into_iter()
        .filter(|m| matches!(m, PanelMessage::Error { .. }))
        .count();
    assert_eq!(errors, 2);
}

#[tokio::test]
async fn test_template_limit_leaves_store_untouched() {
    let app = app(ChunkAgent::new(&[])).await;
    for i in 0..MAX_TEMPLATES {
        app.templates
            .save(template(&format!("template {}", i)))
            .await
            .unwrap();
    }

    let err = app.templates.save(template("eleventh")).await.unwrap_err();
    assert!(matches!(err, AgentPaneError::LimitExceeded { .. }));

    let err = app.templates.save(template("TEMPLATE 3")).await.unwrap_err();
    assert!(matches!(err, AgentPaneError::Duplicate { .. }));

    let names: Vec<_> = app
        .templates
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names.len(), MAX_TEMPLATES);
    assert!(!names.iter().any(|n| n == "eleventh"));
}

#[tokio::test(start_paused = true)]
async fn test_debounced_pair_calls_agent_once() {
    let agent = ChunkAgent::new(&["1"]);
    let provider = CompletionProvider::new(
        agent.clone(),
        CompletionSettings {
            enabled: true,
            debounce_ms: 300,
            context_lines: 20,
        },
        None,
    );
    let request = CompletionRequest {
        uri: "file:///src/lib.rs".to_string(),
        line: 0,
        character: 8,
        text: "let x = ;".to_string(),
        language: Some("rust".to_string()),
    };

    let (first, second) = tokio::join!(provider.provide(request.clone()), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        provider.provide(request.clone()).await
    });

    assert_eq!(first, None);
    assert_eq!(second.as_deref(), Some("1"));
    assert_eq!(agent.calls(), 1);
}
