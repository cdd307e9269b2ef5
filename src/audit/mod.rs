//! Audit trail subsystem
//!
//! Every successful mutation of a document appends exactly one entry.
//!
//! # Principles
//!
//! 1. Newest entry first, regardless of timestamp value
//! 2. Bounded: the oldest entries are evicted once capacity is exceeded
//! 3. Reads and failed writes never append
//! 4. Persisted next to the document in the same namespace

mod trail;

pub use trail::{AuditAction, AuditEntry, AuditTrail, DEFAULT_AUDIT_CAPACITY};
