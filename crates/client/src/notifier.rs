//! Transient user notifications (the app's snackbar).
//!
//! [`Notifier`] fans notifications out over a `tokio::sync::broadcast`
//! channel; the UI layer subscribes and renders whatever arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A message to show briefly to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Snackbar fan-out.
#[derive(Debug)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Channel holding up to `capacity` undelivered notifications; a
    /// capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish a notification. Dropped silently if nobody is listening.
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let notification = Notification {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        };
        tracing::debug!(level = ?notification.level, message = %notification.message, "Notification");
        // A SendError only means there are no receivers.
        let _ = self.sender.send(notification);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
