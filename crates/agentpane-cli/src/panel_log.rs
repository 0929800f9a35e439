//! Tracing layer that forwards warnings and errors to the chat panel.
//!
//! Installed only by `serve`, where the panel reads `log` messages from the
//! same channel that carries the protocol.

use agentpane_core::protocol::PanelMessage;
use std::fmt::Write as _;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

pub struct PanelLogLayer {
    sender: mpsc::UnboundedSender<PanelMessage>,
}

impl PanelLogLayer {
    pub fn new(sender: mpsc::UnboundedSender<PanelMessage>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for PanelLogLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::WARN {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // A closed panel just drops the line.
        let _ = self.sender.send(PanelMessage::Log {
            level: level.to_string(),
            message: visitor.finish(),
        });
    }
}

/// Collects the `message` field, followed by any other fields as `k=v`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, field: &Field, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field, format_args!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(f: impl FnOnce()) -> Vec<PanelMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(PanelLogLayer::new(tx));
        tracing::subscriber::with_default(subscriber, f);

        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    #[test]
    fn test_forwards_warnings_and_errors_only() {
        let messages = capture(|| {
            tracing::info!("loaded");
            tracing::warn!("disk is slow");
            tracing::error!(path = "/tmp/x", "write failed");
        });

        assert_eq!(
            messages,
            vec![
                PanelMessage::Log {
                    level: "WARN".to_string(),
                    message: "disk is slow".to_string(),
                },
                PanelMessage::Log {
                    level: "ERROR".to_string(),
                    message: "write failed path=/tmp/x".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_closed_panel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let subscriber = tracing_subscriber::registry().with(PanelLogLayer::new(tx));
        tracing::subscriber::with_default(subscriber, || tracing::error!("nobody listening"));
    }
}
