use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::store::{ContentAddressedKeys, GetResult};
use crate::{BlobConfig, BlobCtx, BlobError, BlobKeyStrategy, BlobPut, BlobReceipt, BlobResult, BlobStore};

/// The main blob adapter - what publishing services embed to reach storage
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    keys: Arc<dyn BlobKeyStrategy>,
    config: BlobConfig,
}

impl BlobAdapter {
    /// Create a new blob adapter with content-addressed keys
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self {
            store: Arc::new(store),
            keys: Arc::new(ContentAddressedKeys),
            config,
        }
    }

    /// Store bytes and return the durable URL in the receipt.
    ///
    /// Identical content under the same path hint resolves to the same key; if
    /// it is already stored nothing is written and the receipt is marked
    /// `deduplicated`.
    pub async fn put(&self, ctx: BlobCtx, put: BlobPut, body: Bytes) -> BlobResult<BlobReceipt> {
        let size = body.len() as u64;
        if size > self.config.max_blob_bytes {
            return Err(BlobError::TooLarge {
                size,
                max: self.config.max_blob_bytes,
            });
        }
        if put.content_type.trim().is_empty() {
            return Err(BlobError::invalid("content type is required"));
        }

        let key = self.keys.object_key(&put.path_hint, &body, &put.content_type)?;
        let checksum = ContentAddressedKeys::checksum(&body);
        let url = self.url_for(&key);

        let stored = tokio::time::timeout(self.config.put_timeout, async {
            if let Some(head) = self.store.head(&key).await? {
                if head.size_bytes == size {
                    return Ok(None);
                }
            }
            self.store.put(&key, &put.content_type, body).await.map(Some)
        })
        .await
        .map_err(|_| BlobError::Timeout {
            after: self.config.put_timeout,
        })??;

        let receipt = BlobReceipt::new(key, url, size, put.content_type, checksum);
        match stored {
            None => {
                debug!(request_id = %ctx.request_id, key = %receipt.key, "blob already stored");
                Ok(receipt.deduplicated())
            }
            Some(result) => {
                debug!(
                    request_id = %ctx.request_id,
                    actor = ctx.actor_id.as_deref().unwrap_or("-"),
                    filename = put.filename.as_deref().unwrap_or("-"),
                    key = %receipt.key,
                    size = result.size_bytes,
                    "blob stored"
                );
                Ok(receipt)
            }
        }
    }

    /// Read a blob back by key
    pub async fn get(&self, key: &str) -> BlobResult<GetResult> {
        self.store.get(key).await
    }

    /// Durable URL for a key
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url.trim_end_matches('/'), key)
    }

    /// Key for a durable URL issued by this adapter
    pub fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.config.public_base_url.trim_end_matches('/'))
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }

    /// Get configuration
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::store::{ObjectHead, PutResult};
    use crate::MemoryBlobStore;

    fn adapter(store: MemoryBlobStore) -> BlobAdapter {
        BlobAdapter::new(
            store,
            BlobConfig::new().with_public_base_url("https://cdn.example.com/media/"),
        )
    }

    #[tokio::test]
    async fn put_returns_durable_url_under_hint() {
        let blobs = adapter(MemoryBlobStore::new());
        let receipt = blobs
            .put(BlobCtx::new(), BlobPut::new("image/png").with_path_hint("posts/p-1"), Bytes::from_static(b"png"))
            .await
            .unwrap();

        assert!(receipt.url.starts_with("https://cdn.example.com/media/posts/p-1/"));
        assert!(receipt.url.ends_with(".png"));
        assert_eq!(blobs.key_for_url(&receipt.url), Some(receipt.key.as_str()));
        assert_eq!(blobs.get(&receipt.key).await.unwrap().body, Bytes::from_static(b"png"));
        assert!(!receipt.deduplicated);
    }

    #[tokio::test]
    async fn identical_content_is_written_once() {
        let store = MemoryBlobStore::new();
        let blobs = adapter(store.clone());
        let put = BlobPut::new("image/png").with_path_hint("posts/p-1");

        let first = blobs.put(BlobCtx::new(), put.clone(), Bytes::from_static(b"same")).await.unwrap();
        let second = blobs.put(BlobCtx::new(), put, Bytes::from_static(b"same")).await.unwrap();

        assert_eq!(first.url, second.url);
        assert!(second.deduplicated);
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn oversized_blob_is_refused_before_touching_the_store() {
        let store = MemoryBlobStore::new();
        let blobs = BlobAdapter::new(store.clone(), BlobConfig::new().with_max_blob_bytes(4));

        let err = blobs
            .put(BlobCtx::new(), BlobPut::new("image/png"), Bytes::from_static(b"12345"))
            .await
            .unwrap_err();

        assert!(matches!(err, BlobError::TooLarge { size: 5, max: 4 }));
        assert!(store.is_empty().await);
    }

    struct SlowStore;

    #[async_trait]
    impl BlobStore for SlowStore {
        async fn put(&self, _key: &str, _content_type: &str, body: Bytes) -> BlobResult<PutResult> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(PutResult {
                size_bytes: body.len() as u64,
                etag: None,
            })
        }

        async fn get(&self, key: &str) -> BlobResult<GetResult> {
            Err(BlobError::not_found(key))
        }

        async fn head(&self, _key: &str) -> BlobResult<Option<ObjectHead>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> BlobResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn slow_store_surfaces_as_timeout() {
        let blobs = BlobAdapter::new(
            SlowStore,
            BlobConfig::new().with_put_timeout(Duration::from_millis(20)),
        );

        let err = blobs
            .put(BlobCtx::new(), BlobPut::new("image/png"), Bytes::from_static(b"x"))
            .await
            .unwrap_err();

        assert!(matches!(err, BlobError::Timeout { .. }));
        assert!(err.is_transient());
    }
}
