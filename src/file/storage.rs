//! Byte storage for Depot.
//!
//! Content is addressed by an opaque key. Keys are generated by the file
//! service and never reused, so a key's bytes are written once (derived
//! artifacts are rewritten with identical output on reprocessing).

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::{DepotError, Result};

/// Raw content storage addressed by key.
#[async_trait]
pub trait ByteStore: Send + Sync {
    /// Store `bytes` under `key`, replacing anything already there.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Read the bytes stored under `key`. Missing keys are [`DepotError::NotFound`].
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether anything is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Byte store on the local filesystem.
///
/// Files are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   ├── ab12cd34-5678-90ab-cdef-123456789012
/// │   └── ab12cd34-5678-90ab-cdef-123456789012_250
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct DiskByteStore {
    base_path: PathBuf,
}

impl DiskByteStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Root directory of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Full path for a key: `{base_path}/{shard}/{key}`.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(DepotError::Internal(format!("invalid content key: {key:?}")));
        }
        let shard = key.get(..2).unwrap_or(key);
        Ok(self.base_path.join(shard).join(key))
    }
}

#[async_trait]
impl ByteStore for DiskByteStore {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let write_failed = |e: io::Error| DepotError::StorageWriteFailed(e.to_string());

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
        tokio::fs::write(&path, bytes).await.map_err(write_failed)?;

        debug!(content_key = key, size = bytes.len(), "Stored content");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DepotError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
