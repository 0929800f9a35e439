//! `agentpane ask`: one chat turn from the terminal.

use crate::bootstrap::AppContext;
use agentpane_core::agent::AgentClient;
use agentpane_core::protocol::PanelMessage;
use anyhow::{Context, Result, bail};
use std::io::Write;
use tokio::io::AsyncReadExt;

pub async fn run(ctx: &AppContext, words: Vec<String>) -> Result<()> {
    let text = if words.is_empty() {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("Failed to read message from stdin")?;
        input
    } else {
        words.join(" ")
    };
    if text.trim().is_empty() {
        bail!("Nothing to ask");
    }

    let agent = ctx.agent();
    agent
        .is_available()
        .await
        .context("The claude CLI is not available")?;

    let (outbox, mut inbox) = tokio::sync::mpsc::unbounded_channel();
    let controller = ctx.controller(outbox).await?;

    // Prints each streamed update as a delta of what is already on screen.
    let printer = tokio::spawn(async move {
        let mut shown = String::new();
        while let Some(message) = inbox.recv().await {
            let PanelMessage::StreamingUpdate { content, .. } = message else {
                continue;
            };
            let mut stdout = std::io::stdout().lock();
            match content.strip_prefix(shown.as_str()) {
                Some(delta) => {
                    let _ = write!(stdout, "{}", delta);
                }
                None => {
                    let _ = write!(stdout, "\n{}", content);
                }
            }
            let _ = stdout.flush();
            shown = content;
        }
        shown
    });

    let cancel = controller.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel_in_flight();
        }
    });

    let reply = controller.send_message(&text).await;
    ctrl_c.abort();
    drop(controller);
    let shown = printer.await.context("Output task failed")?;

    let reply = reply?;
    if !shown.ends_with('\n') {
        println!();
    }
    tracing::debug!("Reply {} stored", reply.id);
    Ok(())
}
