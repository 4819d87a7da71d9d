//! Blob stores kept in memory or on the local filesystem.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use crate::backend::blob::BlobStore;
use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
}

fn public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{bucket}/{path}",
        base_url.trim_end_matches('/')
    )
}

/// Object keys must be relative and must not climb out of their bucket.
fn checked_key(bucket: &str, path: &str) -> Result<PathBuf, BackendError> {
    let mut key = PathBuf::new();
    for part in [bucket, path] {
        let part = Path::new(part);
        if part.as_os_str().is_empty()
            || !part.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(BackendError::Rejected(format!(
                "invalid object key '{bucket}/{path}'"
            )));
        }
        key.push(part);
    }
    Ok(key)
}

#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredBlob> {
        self.objects.read().get(&format!("{bucket}/{path}")).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BackendError> {
        checked_key(bucket, path)?;
        let key = format!("{bucket}/{path}");
        self.objects.write().insert(
            key.clone(),
            StoredBlob {
                data,
                content_type: content_type.to_owned(),
            },
        );
        Ok(key)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_url(&self.base_url, bucket, path)
    }
}

/// Blob store writing every object to `root/bucket/path`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let target = self.root.join(checked_key(bucket, path)?);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        }
        tokio::fs::write(&target, &data)
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        debug!(path = %target.display(), bytes = data.len(), content_type, "blob written");
        Ok(format!("{bucket}/{path}"))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_url(&self.base_url, bucket, path)
    }
}
