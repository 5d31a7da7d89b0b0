// 📣 Notifications - Human-readable messages collected during one import run
// Passed explicitly through every stage; ends up in the run summary

use serde::{Deserialize, Serialize};

/// Ordered list of messages for the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notifications {
    messages: Vec<String>,
}

impl Notifications {
    pub fn new() -> Self {
        Notifications::default()
    }

    /// Append a message (also emitted as a tracing event)
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "catalog_sync::notify", "{}", message);
        self.messages.push(message);
    }

    pub fn extend(&mut self, other: Notifications) {
        self.messages.extend(other.messages);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.messages.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }

    /// True if any message contains the given fragment
    pub fn contains(&self, fragment: &str) -> bool {
        self.messages.iter().any(|m| m.contains(fragment))
    }
}
