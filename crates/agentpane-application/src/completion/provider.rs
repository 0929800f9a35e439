//! Debounced inline completion.

use super::text::{extract_snippet, trim_suggestion};
use agentpane_core::agent::{AgentClient, AgentContext, AgentRequest};
use agentpane_core::completion::CompletionRequest;
use agentpane_core::config::CompletionSettings;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const COMPLETION_PROMPT: &str = "Complete the code at <CURSOR>. \
Reply with only the code to insert at the cursor, without explanations or markdown.";

#[derive(Debug)]
struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

pub struct CompletionProvider {
    agent: Arc<dyn AgentClient>,
    settings: CompletionSettings,
    workspace_root: Option<String>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    next_generation: AtomicU64,
}

impl CompletionProvider {
    pub fn new(
        agent: Arc<dyn AgentClient>,
        settings: CompletionSettings,
        workspace_root: Option<String>,
    ) -> Self {
        Self {
            agent,
            settings,
            workspace_root,
            in_flight: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Returns a suggestion for `request`, or `None` when completion is
    /// disabled, the request was superseded, or the agent had nothing to add.
    pub async fn provide(&self, request: CompletionRequest) -> Option<String> {
        if !self.settings.enabled {
            return None;
        }

        let key = request.key();
        let (generation, cancel) = self.register(&key);

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(self.settings.debounce_ms)) => {}
            _ = cancel.cancelled() => {
                tracing::trace!("Completion at {} superseded during debounce", key);
                return None;
            }
        }

        let snippet = extract_snippet(
            &request.uri,
            &request.text,
            request.line,
            request.character,
            self.settings.context_lines,
        );
        let after_cursor = snippet.after_cursor.clone();
        let mut agent_request = AgentRequest::new(COMPLETION_PROMPT).with_context(AgentContext {
            workspace_root: self.workspace_root.clone(),
            file: Some(snippet),
            ..Default::default()
        });
        if let Some(language) = request.language {
            agent_request = agent_request.with_language(language);
        }

        tracing::debug!("Requesting completion at {}", key);
        let response = self.agent.complete(&agent_request, None, cancel.clone()).await;
        self.release(&key, generation);

        if cancel.is_cancelled() {
            return None;
        }
        if let Some(error) = response.error {
            tracing::debug!("Completion at {} failed: {}", key, error);
            return None;
        }
        trim_suggestion(&response.suggestion, &after_cursor)
    }

    /// Records a new generation for `key`, cancelling the previous one.
    fn register(&self, key: &str) -> (u64, CancellationToken) {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = in_flight.insert(
            key.to_string(),
            InFlight {
                generation,
                cancel: cancel.clone(),
            },
        ) {
            previous.cancel.cancel();
        }
        (generation, cancel)
    }

    fn release(&self, key: &str, generation: u64) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if in_flight
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
        {
            in_flight.remove(key);
        }
    }
}
