//! Messages exchanged between the chat panel and the controller.
//!
//! Both directions are closed enums serialized as JSON objects tagged by
//! `type`, e.g. `{"type":"sendMessage","text":"hi"}`.

use serde::{Deserialize, Serialize};

use crate::completion::CompletionRequest;
use crate::conversation::{ConversationMessage, ConversationMetadata};
use crate::mcp::McpServerConfig;
use crate::prompt_template::{PromptTemplate, SavePromptTemplateRequest};

/// Messages sent by the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    /// The panel finished loading and wants the current state.
    Ready,
    SendMessage {
        text: String,
    },
    /// Aborts the in-flight agent request.
    CancelRequest,
    ClearChat,
    NewConversation,
    LoadConversation {
        id: String,
    },
    DeleteConversation {
        id: String,
    },
    ListConversations,
    ClearHistory,
    #[serde(rename = "installMCPServer")]
    InstallMcpServer {
        server: McpServerConfig,
    },
    #[serde(rename = "deleteMCPServer")]
    DeleteMcpServer {
        name: String,
    },
    #[serde(rename = "listMCPServers")]
    ListMcpServers,
    ListTemplates,
    SaveTemplate {
        template: SavePromptTemplateRequest,
    },
    DeleteTemplate {
        id: String,
    },
    /// Activates a template, or deactivates all when `id` is absent.
    ActivateTemplate {
        #[serde(default)]
        id: Option<String>,
    },
    /// Asks for an inline suggestion; a newer request at the same key
    /// supersedes this one.
    RequestCompletion {
        request: CompletionRequest,
    },
}

/// Whether the controller is currently waiting on the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    Idle,
    Streaming,
}

/// Messages sent to the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PanelMessage {
    /// Full message list of the current conversation.
    UpdateMessages {
        conversation_id: String,
        messages: Vec<ConversationMessage>,
    },
    /// Replacement content of a message that is being streamed.
    StreamingUpdate {
        message_id: String,
        content: String,
        is_complete: bool,
    },
    ConversationList {
        conversations: Vec<ConversationMetadata>,
    },
    #[serde(rename = "mcpServers")]
    McpServers {
        servers: Vec<McpServerConfig>,
    },
    Templates {
        templates: Vec<PromptTemplate>,
    },
    Status {
        state: ChatState,
    },
    Error {
        message: String,
    },
    /// Answer to `requestCompletion`. `suggestion` is absent when the
    /// request was superseded, disabled, or produced nothing.
    Completion {
        key: String,
        suggestion: Option<String>,
    },
    /// A forwarded warning/error log line.
    Log {
        level: String,
        message: String,
    },
}

impl PanelMessage {
    pub fn error(message: impl Into<String>) -> Self {
        PanelMessage::Error {
            message: message.into(),
        }
    }
}
