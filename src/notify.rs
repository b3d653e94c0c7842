//! Transient user-facing notifications.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Fan-out of notifications to whatever is rendering them.
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Level::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Level::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Level::Error, message.into());
    }

    fn publish(&self, level: Level, message: String) {
        match level {
            Level::Info => info!(notification = %message),
            Level::Warning => warn!(notification = %message),
            Level::Error => error!(notification = %message),
        }
        // Nobody listening is fine.
        let _ = self.sender.send(Notification { level, message });
    }
}
