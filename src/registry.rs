//! Named store registry
//!
//! Stores are created implicitly the first time a name is opened. Each store
//! sits behind its own async mutex, which serializes every operation on that
//! store; stores with different names never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use crate::config::StoreConfig;
use crate::document::{DocumentStore, StoreResult};
use crate::kv::{FileKvProvider, KvProvider, MemKvProvider};
use crate::observability::{log_event, Event};

/// Handle to an opened store
pub type SharedStore = Arc<Mutex<DocumentStore>>;

#[derive(Debug)]
pub struct StoreRegistry {
    provider: Arc<dyn KvProvider>,
    audit_capacity: usize,
    stores: Mutex<HashMap<String, SharedStore>>,
}

impl StoreRegistry {
    pub fn new(provider: Arc<dyn KvProvider>) -> Self {
        Self {
            provider,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over process-local memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemKvProvider::new()))
    }

    /// File-backed registry rooted at `config.data_dir`
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(Arc::new(FileKvProvider::new(config.data_dir.clone())))
            .with_audit_capacity(config.audit_capacity)
    }

    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// Return the store called `name`, creating it on first reference.
    ///
    /// Opening does not read the backend; the store hydrates on first use.
    pub async fn open(&self, name: &str) -> StoreResult<SharedStore> {
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }

        let backend = self.provider.namespace(name)?;
        let store = DocumentStore::new(name, backend).with_audit_capacity(self.audit_capacity);
        let store = Arc::new(Mutex::new(store));
        stores.insert(name.to_string(), Arc::clone(&store));

        log_event(Event::StoreOpened, name, "");
        Ok(store)
    }

    /// Names of the stores opened so far, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StoreError;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_returns_same_store() {
        let registry = StoreRegistry::in_memory();
        let a = registry.open("users").await.unwrap();
        let b = registry.open("users").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.lock().await.name(), "users");

        registry.open("settings").await.unwrap();
        assert_eq!(registry.names().await, vec!["settings", "users"]);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let registry = StoreRegistry::in_memory();
        let users = registry.open("users").await.unwrap();
        let tasks = registry.open("tasks").await.unwrap();

        users.lock().await.set("name", json!("Alice")).await.unwrap();
        tasks.lock().await.push(json!("write docs")).await.unwrap();

        assert_eq!(tasks.lock().await.get_all().await.unwrap(), json!(["write docs"]));
        assert_eq!(users.lock().await.keys().await.unwrap(), vec!["name"]);
    }

    #[tokio::test]
    async fn test_concurrent_pushes_are_serialized() {
        let registry = Arc::new(StoreRegistry::in_memory());
        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let store = registry.open("queue").await.unwrap();
                let mut store = store.lock().await;
                store.push(json!(i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let store = registry.open("queue").await.unwrap();
        let mut store = store.lock().await;
        assert_eq!(store.get_all().await.unwrap().len(), 16);
        assert_eq!(store.get_audit_log().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_from_config_uses_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::default().with_audit_capacity(2);
        let config = StoreConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..config
        };

        let registry = StoreRegistry::from_config(&config);
        let store = registry.open("prefs").await.unwrap();
        let mut store = store.lock().await;
        for i in 0..5 {
            store.set("n", json!(i)).await.unwrap();
        }

        assert!(temp_dir.path().join("prefs").join("document.json").exists());
        assert_eq!(store.get_audit_log().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_name_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(Arc::new(FileKvProvider::new(temp_dir.path())));
        let err = registry.open("../escape").await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(registry.names().await.is_empty());
    }
}
