//! # Key-Value Backend Trait
//!
//! The durable collaborator behind a document store. One backend instance is
//! scoped to one store's private namespace and is read-your-writes consistent.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::errors::KvResult;

/// Boxed future returned by backend operations
pub type KvFuture<'a, T> = Pin<Box<dyn Future<Output = KvResult<T>> + Send + 'a>>;

/// Asynchronous get/put store for JSON values
pub trait KvStore: Send + Sync + Debug {
    /// Read the value stored under `key`, `None` if never written
    fn get<'a>(&'a self, key: &'a str) -> KvFuture<'a, Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    fn put<'a>(&'a self, key: &'a str, value: Value) -> KvFuture<'a, ()>;

    /// Store several entries.
    ///
    /// The default writes them one by one, so a failure can leave a prefix
    /// written. Backends with a multi-key primitive override this to be atomic.
    fn put_many<'a>(&'a self, entries: Vec<(String, Value)>) -> KvFuture<'a, ()> {
        Box::pin(async move {
            for (key, value) in entries {
                self.put(&key, value).await?;
            }
            Ok(())
        })
    }
}

/// Produces the backend for a named store namespace
pub trait KvProvider: Send + Sync + Debug {
    fn namespace(&self, name: &str) -> KvResult<Arc<dyn KvStore>>;
}
