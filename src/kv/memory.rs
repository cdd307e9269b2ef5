//! # In-Memory Backend
//!
//! Process-local backend used for tests and ephemeral stores. `put_many` is
//! applied under a single write lock and is therefore atomic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::backend::{KvFuture, KvProvider, KvStore};
use super::errors::{KvError, KvResult};

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemKvStore {
    data: RwLock<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with an I/O error (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> KvResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KvError::Io("writes disabled".into()));
        }
        Ok(())
    }
}

impl KvStore for MemKvStore {
    fn get<'a>(&'a self, key: &'a str) -> KvFuture<'a, Option<Value>> {
        Box::pin(async move { Ok(self.data.read().await.get(key).cloned()) })
    }

    fn put<'a>(&'a self, key: &'a str, value: Value) -> KvFuture<'a, ()> {
        Box::pin(async move {
            self.check_writable()?;
            self.data.write().await.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn put_many<'a>(&'a self, entries: Vec<(String, Value)>) -> KvFuture<'a, ()> {
        Box::pin(async move {
            self.check_writable()?;
            let mut data = self.data.write().await;
            for (key, value) in entries {
                data.insert(key, value);
            }
            Ok(())
        })
    }
}

/// Hands out one shared in-memory store per namespace
#[derive(Debug, Default)]
pub struct MemKvProvider {
    namespaces: std::sync::Mutex<HashMap<String, Arc<MemKvStore>>>,
}

impl MemKvProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the concrete store for a namespace, creating it if needed
    pub fn store(&self, name: &str) -> KvResult<Arc<MemKvStore>> {
        let mut namespaces = self
            .namespaces
            .lock()
            .map_err(|e| KvError::Io(format!("namespace lock poisoned: {}", e)))?;
        Ok(Arc::clone(
            namespaces
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemKvStore::new())),
        ))
    }
}

impl KvProvider for MemKvProvider {
    fn namespace(&self, name: &str) -> KvResult<Arc<dyn KvStore>> {
        let store: Arc<dyn KvStore> = self.store(name)?;
        Ok(store)
    }
}
