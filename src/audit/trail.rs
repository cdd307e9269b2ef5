//! Bounded, newest-first audit trail

use std::collections::VecDeque;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept unless configured otherwise
pub const DEFAULT_AUDIT_CAPACITY: usize = 100;

/// Mutation recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditAction {
    /// Single key written
    Set,
    /// Bulk replace-and-merge
    SetAll,
    /// Array element appended
    Push,
    /// Key removed
    Delete,
    /// Document emptied
    Clear,
}

impl AuditAction {
    /// Returns the action name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Set => "set",
            AuditAction::SetAll => "setAll",
            AuditAction::Push => "push",
            AuditAction::Delete => "delete",
            AuditAction::Clear => "clear",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// The mutation that occurred.
    pub action: AuditAction,

    /// Keys affected, empty for whole-document and array operations.
    pub keys: Vec<String>,
}

impl AuditEntry {
    /// Create an entry stamped with the current wall-clock time.
    pub fn now(action: AuditAction, keys: Vec<String>) -> Self {
        Self::at(Utc::now().timestamp_millis(), action, keys)
    }

    pub fn at(timestamp: i64, action: AuditAction, keys: Vec<String>) -> Self {
        Self {
            timestamp,
            action,
            keys,
        }
    }
}

/// Newest-first ring of audit entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTrail {
    capacity: usize,
    entries: VecDeque<AuditEntry>,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditTrail {
    /// Create an empty trail. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Rebuild a trail from persisted entries (newest first).
    ///
    /// Entries beyond capacity are dropped from the old end.
    pub fn from_entries(entries: Vec<AuditEntry>, capacity: usize) -> Self {
        let mut trail = Self::new(capacity);
        trail.entries.extend(entries);
        trail.entries.truncate(trail.capacity);
        trail
    }

    /// Insert at the front and evict beyond capacity
    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, newest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }
}
