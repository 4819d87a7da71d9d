use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendError;

/// Bucketed object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `bucket/path`, replacing any existing object, and
    /// return the stored object key.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BackendError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}
