//! Notifier implementations.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

use logiflow_agents::{Department, Notifier};

/// Emits every notification as a structured log record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_client(&self, client_id: &str, message: &str) {
        info!(client_id, message, "client notification");
    }

    fn notify_internal(&self, department: Department, message: &str) {
        info!(department = %department, message, "internal notification");
    }

    fn notify_urgent(&self, recipient: Department, message: &str) {
        warn!(recipient = %recipient, message, "URGENT alert");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Client { client_id: String, message: String },
    Internal { department: Department, message: String },
    Urgent { recipient: Department, message: String },
}

/// Keeps every notification in memory (tests, dev inspection).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn client_messages(&self, client_id: &str) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Client { client_id: c, message } if c == client_id => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn urgent_for(&self, department: Department) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Urgent { recipient, message } if recipient == department => {
                    Some(message)
                }
                _ => None,
            })
            .collect()
    }

    pub fn internal_for(&self, department: Department) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Internal { department: d, message } if d == department => {
                    Some(message)
                }
                _ => None,
            })
            .collect()
    }

    fn push(&self, n: Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(n);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify_client(&self, client_id: &str, message: &str) {
        self.push(Notification::Client {
            client_id: client_id.to_string(),
            message: message.to_string(),
        });
    }

    fn notify_internal(&self, department: Department, message: &str) {
        self.push(Notification::Internal {
            department,
            message: message.to_string(),
        });
    }

    fn notify_urgent(&self, recipient: Department, message: &str) {
        self.push(Notification::Urgent {
            recipient,
            message: message.to_string(),
        });
    }
}

/// Sends each notification to two notifiers.
#[derive(Debug, Default, Clone)]
pub struct FanoutNotifier<A, B> {
    first: A,
    second: B,
}

impl<A, B> FanoutNotifier<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Notifier, B: Notifier> Notifier for FanoutNotifier<A, B> {
    fn notify_client(&self, client_id: &str, message: &str) {
        self.first.notify_client(client_id, message);
        self.second.notify_client(client_id, message);
    }

    fn notify_internal(&self, department: Department, message: &str) {
        self.first.notify_internal(department, message);
        self.second.notify_internal(department, message);
    }

    fn notify_urgent(&self, recipient: Department, message: &str) {
        self.first.notify_urgent(recipient, message);
        self.second.notify_urgent(recipient, message);
    }
}
