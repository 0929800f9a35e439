use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::request::{AgentRequest, AgentResponse};
use crate::error::Result;

/// Receives the whole accumulated response after every streamed increment.
pub type UpdateCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// A client able to answer a prompt with a (streamed) response.
///
/// `complete` never fails: agent errors, timeouts and cancellations are
/// reported through [`AgentResponse::error`], with whatever text was
/// accumulated before the failure kept in `suggestion`.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Runs one request to completion.
    ///
    /// Cancelling `cancel` aborts the underlying call.
    async fn complete(
        &self,
        request: &AgentRequest,
        on_update: Option<UpdateCallback<'_>>,
        cancel: CancellationToken,
    ) -> AgentResponse;

    /// Human-readable client name for logs.
    fn name(&self) -> String;

    /// Checks that the agent can be reached.
    async fn is_available(&self) -> Result<()>;
}
