mod alerts;
mod chat;

pub use alerts::{AlertKind, AlertsClient};
pub use chat::ChatClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Alert service rejected the request: {0}")]
    Rejected(String),
}

/// Site-wide announcements: a free-text chat broadcast plus a typed alert
/// for the stream overlay. Callers treat both as best-effort.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn send_broadcast(&self, message: &str) -> Result<(), NotifyError>;
    async fn send_alert(&self, message: &str, kind: AlertKind) -> Result<(), NotifyError>;
}

/// Production announcer: chat over Redis, alerts over HTTP. Either leg may
/// be left unconfigured; an absent leg is a no-op.
pub struct Notifier {
    chat: Option<ChatClient>,
    alerts: Option<AlertsClient>,
}

impl Notifier {
    pub fn new(chat: Option<ChatClient>, alerts: Option<AlertsClient>) -> Self {
        Self { chat, alerts }
    }
}

#[async_trait]
impl Announcer for Notifier {
    async fn send_broadcast(&self, message: &str) -> Result<(), NotifyError> {
        match &self.chat {
            Some(chat) => chat.send_broadcast(message).await,
            None => {
                tracing::debug!(message, "chat broadcast skipped, no chat transport");
                Ok(())
            }
        }
    }

    async fn send_alert(&self, message: &str, kind: AlertKind) -> Result<(), NotifyError> {
        match &self.alerts {
            Some(alerts) => alerts.send_alert(message, kind).await,
            None => {
                tracing::debug!(message, "alert skipped, no alert service configured");
                Ok(())
            }
        }
    }
}
