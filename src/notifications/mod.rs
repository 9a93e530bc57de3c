//! Bounded notification log.
//!
//! Holds the ten most recent messages, newest first. `unread_count` is an
//! additive counter that is independent of the list: it grows with every
//! push and nothing in the game lowers it.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const NOTIFICATION_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationLog {
    pub unread_count: u64,
    pub messages: VecDeque<NotificationEntry>,
    /// Id handed to the next entry. Persisted so ids stay monotonic across reloads.
    next_id: u64,
}

impl NotificationLog {
    /// Prepend a message, dropping the oldest once over capacity. Returns the new id.
    pub fn push(&mut self, message: impl Into<String>, severity: Severity, timestamp: i64) -> u64 {
        // Blobs written before `next_id` existed still carry ids.
        let floor = self.messages.iter().map(|m| m.id.saturating_add(1)).max().unwrap_or(0);
        let id = self.next_id.max(floor);
        self.next_id = id.saturating_add(1);

        self.messages.push_front(NotificationEntry {
            id,
            message: message.into(),
            severity,
            timestamp,
        });
        self.messages.truncate(NOTIFICATION_CAPACITY);
        self.unread_count += 1;
        id
    }

    /// Drop entries past the capacity a loaded blob may carry.
    pub fn repair(&mut self) {
        self.messages.truncate(NOTIFICATION_CAPACITY);
    }

    pub fn latest(&self) -> Option<&NotificationEntry> {
        self.messages.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Entries with an id greater than `id`, oldest first.
    pub fn newer_than(&self, id: Option<u64>) -> Vec<&NotificationEntry> {
        let mut fresh: Vec<&NotificationEntry> = self
            .messages
            .iter()
            .filter(|m| id.map_or(true, |seen| m.id > seen))
            .collect();
        fresh.reverse();
        fresh
    }
}
