//! In-memory repositories and a scripted agent for unit tests.

use agentpane_core::agent::{AgentClient, AgentRequest, AgentResponse, UpdateCallback};
use agentpane_core::conversation::{Conversation, ConversationMetadata, ConversationRepository};
use agentpane_core::mcp::{McpRepository, McpServerConfig};
use agentpane_core::prompt_template::{PromptTemplate, PromptTemplateRepository};
use agentpane_core::{AgentPaneError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// Mock ConversationRepository
pub struct InMemoryConversationRepository {
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn save(&self, conversation: &Conversation) -> Result<()> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id().to_string(), conversation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.get(id))
    }

    async fn list(&self) -> Result<Vec<ConversationMetadata>> {
        let mut list: Vec<_> = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .map(|c| c.metadata.clone())
            .collect();
        list.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(list)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.conversations.lock().unwrap().remove(id);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.conversations.lock().unwrap().clear();
        Ok(())
    }
}

// Mock ConversationRepository whose disk is gone
pub struct FailingConversationRepository;

#[async_trait]
impl ConversationRepository for FailingConversationRepository {
    async fn save(&self, _conversation: &Conversation) -> Result<()> {
        Err(AgentPaneError::io("disk full"))
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<Conversation>> {
        Err(AgentPaneError::io("disk gone"))
    }

    async fn list(&self) -> Result<Vec<ConversationMetadata>> {
        Err(AgentPaneError::io("disk gone"))
    }

    async fn delete(&self, _id: &str) -> Result<()> {
        Err(AgentPaneError::io("disk gone"))
    }

    async fn clear_all(&self) -> Result<()> {
        Err(AgentPaneError::io("disk gone"))
    }
}

// Mock McpRepository
pub struct InMemoryMcpRepository {
    servers: Mutex<BTreeMap<String, McpServerConfig>>,
}

impl InMemoryMcpRepository {
    pub fn new() -> Self {
        Self {
            servers: Mutex::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl McpRepository for InMemoryMcpRepository {
    async fn list(&self) -> Result<Vec<McpServerConfig>> {
        Ok(self.servers.lock().unwrap().values().cloned().collect())
    }

    async fn get(&self, name: &str) -> Result<Option<McpServerConfig>> {
        Ok(self.servers.lock().unwrap().get(name).cloned())
    }

    async fn add(&self, server: McpServerConfig) -> Result<()> {
        let mut servers = self.servers.lock().unwrap();
        if servers.contains_key(&server.name) {
            return Err(AgentPaneError::duplicate("MCP server", server.name));
        }
        servers.insert(server.name.clone(), server);
        Ok(())
    }

    async fn upsert(&self, server: McpServerConfig) -> Result<()> {
        self.servers
            .lock()
            .unwrap()
            .insert(server.name.clone(), server);
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.servers
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AgentPaneError::not_found("MCP server", name))
    }
}

// Mock PromptTemplateRepository
pub struct InMemoryPromptTemplateRepository {
    templates: Mutex<HashMap<String, PromptTemplate>>,
}

impl InMemoryPromptTemplateRepository {
    pub fn new() -> Self {
        Self {
            templates: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PromptTemplateRepository for InMemoryPromptTemplateRepository {
    async fn list(&self) -> Result<Vec<PromptTemplate>> {
        let mut list: Vec<_> = self.templates.lock().unwrap().values().cloned().collect();
        list.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn get(&self, id: &str) -> Result<Option<PromptTemplate>> {
        Ok(self.templates.lock().unwrap().get(id).cloned())
    }

    async fn save(&self, template: &PromptTemplate) -> Result<()> {
        self.templates
            .lock()
            .unwrap()
            .insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.templates
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AgentPaneError::not_found("prompt template", id))
    }
}

/// Agent that replays fixed chunks, optionally pausing before finishing.
pub struct ScriptedAgent {
    chunks: Vec<String>,
    error: Option<String>,
    pause: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedAgent {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            error: None,
            pause: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Waits this long after the chunks, or until cancelled.
    pub fn pausing(mut self, pause: Duration) -> Self {
        self.pause = Some(pause);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn complete(
        &self,
        request: &AgentRequest,
        on_update: Option<UpdateCallback<'_>>,
        cancel: CancellationToken,
    ) -> AgentResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let mut text = String::new();
        for chunk in &self.chunks {
            text.push_str(chunk);
            if let Some(callback) = on_update {
                callback(&text);
            }
        }

        if let Some(pause) = self.pause {
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = cancel.cancelled() => return AgentResponse::failed(text, "Request cancelled"),
            }
        }

        match &self.error {
            Some(error) => AgentResponse::failed(text, error.clone()),
            None => AgentResponse::ok(text),
        }
    }

    fn name(&self) -> String {
        "ScriptedAgent".to_string()
    }

    async fn is_available(&self) -> Result<()> {
        Ok(())
    }
}
