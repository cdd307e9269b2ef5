//! docshape - schema-aware JSON document stores
//!
//! Each named store owns exactly one JSON document (an object or an array).
//! The first write infers a structural descriptor; every later write is
//! validated against it. Stores carry a policy (auto-strip, read-only) and a
//! bounded, newest-first audit trail, all persisted through a pluggable
//! key-value backend.
//!
//! ```no_run
//! use docshape::registry::StoreRegistry;
//! use serde_json::json;
//!
//! # async fn demo() -> docshape::document::StoreResult<()> {
//! let registry = StoreRegistry::in_memory();
//! let users = registry.open("users").await?;
//! let mut users = users.lock().await;
//! users.set_all(json!({"name": "Alice", "email": "alice@example.com"})).await?;
//! assert_eq!(users.get("name").await?, Some(json!("Alice")));
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod document;
pub mod kv;
pub mod observability;
pub mod policy;
pub mod registry;
pub mod schema;
