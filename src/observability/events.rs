//! Observable events of a document store
//!
//! Events are explicit and typed; every log line emitted by the store
//! carries one of these names in its `event` field.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Store state loaded from the backend
    StoreHydrated,
    /// Store instance created by the registry
    StoreOpened,

    // Schema
    /// Descriptor inferred from a first write
    SchemaInferred,
    /// Descriptor replaced administratively
    SchemaReplaced,
    /// Replacement changed the shape of existing fields
    SchemaDrift,

    // Writes
    /// Mutation validated and persisted
    WriteCommit,
    /// Mutation refused (policy, mode or validation)
    WriteRejected,
    /// Persisting a mutation failed; memory rolled back
    WriteFailed,

    // Administration
    /// Policy updated
    OptionsChanged,
    /// Audit trail emptied
    AuditCleared,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreHydrated => "STORE_HYDRATED",
            Event::StoreOpened => "STORE_OPENED",
            Event::SchemaInferred => "SCHEMA_INFERRED",
            Event::SchemaReplaced => "SCHEMA_REPLACED",
            Event::SchemaDrift => "SCHEMA_DRIFT",
            Event::WriteCommit => "WRITE_COMMIT",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::WriteFailed => "WRITE_FAILED",
            Event::OptionsChanged => "OPTIONS_CHANGED",
            Event::AuditCleared => "AUDIT_CLEARED",
        }
    }

    /// Returns true if the event should be logged at WARN or above
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::SchemaDrift | Event::WriteRejected | Event::WriteFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
