//! # Local Filesystem Backend
//!
//! Layout: `<root>/<namespace>/<key>.json`, one file per key.
//!
//! Each file holds an envelope `{"checksum": u32, "payload": "<json text>"}`
//! where the checksum is the CRC32 of the payload bytes. Writes go to a
//! temporary sibling and are renamed into place, so a reader never observes
//! a half-written file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::backend::{KvFuture, KvProvider, KvStore};
use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{KvError, KvResult};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    checksum: u32,
    payload: String,
}

/// File-backed key-value store for one namespace
#[derive(Debug)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Create a store rooted at `<root>/<namespace>`.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: &Path, namespace: &str) -> KvResult<Self> {
        validate_segment(namespace)?;
        Ok(Self {
            dir: root.join(namespace),
        })
    }

    /// Returns the file path for a key
    pub fn key_path(&self, key: &str) -> KvResult<PathBuf> {
        validate_segment(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }

    async fn read_entry(&self, key: &str) -> KvResult<Option<Value>> {
        let path = self.key_path(key)?;

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope: Envelope = serde_json::from_slice(&raw).map_err(|e| KvError::Corrupted {
            key: key.to_string(),
            reason: format!("unreadable envelope: {}", e),
        })?;

        if !verify_checksum(envelope.payload.as_bytes(), envelope.checksum) {
            return Err(KvError::Corrupted {
                key: key.to_string(),
                reason: "checksum mismatch".into(),
            });
        }

        let value = serde_json::from_str(&envelope.payload).map_err(|e| KvError::Corrupted {
            key: key.to_string(),
            reason: format!("unreadable payload: {}", e),
        })?;

        Ok(Some(value))
    }

    async fn write_entry(&self, key: &str, value: &Value) -> KvResult<()> {
        let path = self.key_path(key)?;
        fs::create_dir_all(&self.dir).await?;

        let payload = serde_json::to_string(value)?;
        let envelope = Envelope {
            checksum: compute_checksum(payload.as_bytes()),
            payload,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

impl KvStore for FileKvStore {
    fn get<'a>(&'a self, key: &'a str) -> KvFuture<'a, Option<Value>> {
        Box::pin(self.read_entry(key))
    }

    fn put<'a>(&'a self, key: &'a str, value: Value) -> KvFuture<'a, ()> {
        Box::pin(async move { self.write_entry(key, &value).await })
    }
}

/// Creates one `FileKvStore` per namespace under a common root
#[derive(Debug, Clone)]
pub struct FileKvProvider {
    root: PathBuf,
}

impl FileKvProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl KvProvider for FileKvProvider {
    fn namespace(&self, name: &str) -> KvResult<Arc<dyn KvStore>> {
        Ok(Arc::new(FileKvStore::new(&self.root, name)?))
    }
}

/// Rejects names that would escape the namespace directory.
fn validate_segment(segment: &str) -> KvResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(KvError::InvalidKey(segment.to_string()));
    }
    Ok(())
}
