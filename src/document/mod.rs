//! Document stores
//!
//! A `DocumentStore` owns one JSON document (object or array), its
//! descriptor, its policy and its audit trail, all persisted under four keys
//! of a private `KvStore` namespace.

mod errors;
mod store;
mod types;

pub use errors::{StoreError, StoreResult};
pub use store::{DocumentStore, AUDIT_KEY, DOCUMENT_KEY, OPTIONS_KEY, SCHEMA_KEY};
pub use types::{Document, Mode};
