//! `agentpane serve`: the panel protocol over stdio.
//!
//! Each stdin line is one [`HostMessage`]; each stdout line is one
//! [`PanelMessage`]. The command exits when stdin closes.

use crate::bootstrap::AppContext;
use agentpane_core::protocol::{HostMessage, PanelMessage};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub async fn run(
    ctx: &AppContext,
    outbox: UnboundedSender<PanelMessage>,
    inbox: UnboundedReceiver<PanelMessage>,
) -> Result<()> {
    let controller = ctx.controller(outbox.clone()).await?;
    let shutdown = CancellationToken::new();
    let writer = tokio::spawn(write_panel_messages(inbox, shutdown.clone()));

    tracing::info!("Serving panel protocol on stdio");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut requests = JoinSet::new();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HostMessage>(&line) {
            Ok(message) => {
                if let Some(task) = controller.handle(message).await {
                    requests.spawn(async move {
                        if let Err(e) = task.await {
                            tracing::error!("Request task failed: {}", e);
                        }
                    });
                }
            }
            Err(e) => {
                tracing::debug!("Rejected panel line: {}", line);
                let _ = outbox.send(PanelMessage::error(format!("Invalid message: {}", e)));
            }
        }
        // Reap finished requests.
        while requests.try_join_next().is_some() {}
    }

    tracing::info!("stdin closed; shutting down");
    controller.cancel_in_flight();
    while requests.join_next().await.is_some() {}

    shutdown.cancel();
    writer.await.context("Panel writer failed")??;
    Ok(())
}

async fn write_panel_messages(
    mut inbox: UnboundedReceiver<PanelMessage>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    loop {
        let message = tokio::select! {
            message = inbox.recv() => message,
            _ = shutdown.cancelled() => inbox.try_recv().ok(),
        };
        let Some(message) = message else { break };

        let mut line = serde_json::to_vec(&message).context("Failed to encode panel message")?;
        line.push(b'\n');
        stdout.write_all(&line).await.context("Failed to write stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
    }
    Ok(())
}
