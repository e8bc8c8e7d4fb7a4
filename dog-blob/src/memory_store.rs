use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::store::{ContentAddressedKeys, GetResult, ObjectHead, PutResult};
use crate::{BlobError, BlobResult, BlobStore};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    etag: String,
}

/// In-memory store for development and tests.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of puts that actually wrote bytes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> BlobResult<PutResult> {
        let etag = ContentAddressedKeys::checksum(&body);
        let size_bytes = body.len() as u64;

        let mut objects = self.objects.write().await;
        if objects.get(key).is_some_and(|existing| existing.etag == etag) {
            return Ok(PutResult {
                size_bytes,
                etag: Some(etag),
            });
        }

        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                etag: etag.clone(),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(PutResult {
            size_bytes,
            etag: Some(etag),
        })
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        let objects = self.objects.read().await;
        let object = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;
        Ok(GetResult {
            body: object.body.clone(),
            content_type: object.content_type.clone(),
        })
    }

    async fn head(&self, key: &str) -> BlobResult<Option<ObjectHead>> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).map(|object| ObjectHead {
            size_bytes: object.body.len() as u64,
            content_type: object.content_type.clone(),
            etag: Some(object.etag.clone()),
        }))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_bytes_under_one_key_write_once() {
        let store = MemoryBlobStore::new();
        store.put("p/a.png", "image/png", Bytes::from_static(b"a")).await.unwrap();
        store.put("p/a.png", "image/png", Bytes::from_static(b"a")).await.unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.keys().await, vec!["p/a.png"]);
    }

    #[tokio::test]
    async fn delete_forgets_the_object() {
        let store = MemoryBlobStore::new();
        store.put("p/a.png", "image/png", Bytes::from_static(b"a")).await.unwrap();

        store.delete("p/a.png").await.unwrap();
        store.delete("p/a.png").await.unwrap();

        assert!(store.head("p/a.png").await.unwrap().is_none());
        assert!(matches!(store.get("p/a.png").await, Err(BlobError::NotFound { .. })));
        assert!(store.is_empty().await);
    }
}
