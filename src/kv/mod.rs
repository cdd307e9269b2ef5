//! Durable key-value collaborator
//!
//! The document store only needs `get` / `put` of JSON values by string key
//! inside a private namespace. This module defines that contract and ships
//! two backends:
//!
//! - `MemKvStore`: process-local, atomic multi-key writes
//! - `FileKvStore`: one checksummed JSON file per key

mod backend;
mod checksum;
mod errors;
mod file;
mod memory;

pub use backend::{KvFuture, KvProvider, KvStore};
pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{KvError, KvResult};
pub use file::{FileKvProvider, FileKvStore};
pub use memory::{MemKvProvider, MemKvStore};
