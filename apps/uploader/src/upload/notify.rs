#![allow(dead_code)]

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// A user-facing outcome message. The core only describes notifications;
/// dispatching them is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }
}

/// Receives notifications for display (toast, terminal, log...).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);

    fn notify_all(&self, notifications: &[Notification]) {
        for n in notifications {
            self.notify(n);
        }
    }
}

/// Writes notifications to the tracing subscriber.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Info => info!("{}: {}", notification.title, notification.description),
            Severity::Error => error!("{}: {}", notification.title, notification.description),
        }
    }
}

/// Keeps every notification in memory, in dispatch order.
#[derive(Default)]
pub struct CollectingSink {
    received: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    pub fn take(&self) -> Vec<Notification> {
        match self.received.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notification: &Notification) {
        let mut guard = match self.received.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(notification.clone());
    }
}
