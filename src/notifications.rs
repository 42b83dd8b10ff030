//! Transient, dismissible notifications.
//!
//! Holds wallet and claim failures that are shown next to the status line
//! until the user dismisses them.

use crate::presenter::Severity;
use std::collections::VecDeque;

/// Oldest entries are dropped beyond this.
pub const MAX_NOTIFICATIONS: usize = 20;

/// A notification entry with message and timestamp
#[derive(Clone, Debug)]
pub struct NotificationEntry {
    pub message: String,
    pub severity: Severity,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl NotificationEntry {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            timestamp: chrono::Local::now(),
        }
    }

    pub fn time_ago(&self) -> String {
        let now = chrono::Local::now();
        let duration = now.signed_duration_since(self.timestamp);
        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            self.timestamp.format("%m/%d %H:%M").to_string()
        }
    }
}

#[derive(Debug, Default)]
pub struct Notifications {
    entries: VecDeque<NotificationEntry>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        self.entries.push_back(NotificationEntry::new(message, severity));
        while self.entries.len() > MAX_NOTIFICATIONS {
            self.entries.pop_front();
        }
    }

    /// Remove the entry at `index` (oldest first). Returns it if it existed.
    pub fn dismiss(&mut self, index: usize) -> Option<NotificationEntry> {
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn latest(&self) -> Option<&NotificationEntry> {
        self.entries.back()
    }

    pub fn entries(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
