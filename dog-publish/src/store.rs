use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::PersistError;
use crate::record::PublishedDocument;

/// Durable storage for published posts.
///
/// `upsert` must be atomic per document: readers see either the previous
/// record or the new one with every locale variant, never a mix.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert or replace by id. Fails with [`PersistError::SlugConflict`] when the
    /// slug belongs to a different post.
    async fn upsert(&self, doc: &PublishedDocument) -> Result<(), PersistError>;

    async fn get(&self, id: &str) -> Result<Option<PublishedDocument>, PersistError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PublishedDocument>, PersistError>;
}

#[derive(Default)]
struct PostIndex {
    by_id: HashMap<String, PublishedDocument>,
    slugs: HashMap<String, String>,
}

/// In-memory post store; one write lock covers the slug check and the write.
///
/// Cloning shares the underlying index.
#[derive(Clone, Default)]
pub struct MemoryPostStore {
    index: Arc<RwLock<PostIndex>>,
    offline: Arc<AtomicBool>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `StorageUnavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), PersistError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PersistError::StorageUnavailable("memory store is offline".into()));
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.by_id.is_empty()
    }

    pub async fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.index.read().await.slugs.keys().cloned().collect();
        slugs.sort();
        slugs
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn upsert(&self, doc: &PublishedDocument) -> Result<(), PersistError> {
        self.ensure_online()?;
        let mut index = self.index.write().await;

        if let Some(owner) = index.slugs.get(&doc.slug) {
            if owner != &doc.id {
                return Err(PersistError::SlugConflict {
                    slug: doc.slug.clone(),
                });
            }
        }

        let previous_slug = index
            .by_id
            .get(&doc.id)
            .map(|existing| existing.slug.clone())
            .filter(|slug| slug != &doc.slug);
        if let Some(previous) = previous_slug {
            debug!(id = %doc.id, from = %previous, to = %doc.slug, "post slug changed");
            index.slugs.remove(&previous);
        }

        index.slugs.insert(doc.slug.clone(), doc.id.clone());
        index.by_id.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<PublishedDocument>, PersistError> {
        self.ensure_online()?;
        Ok(self.index.read().await.by_id.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PublishedDocument>, PersistError> {
        self.ensure_online()?;
        let index = self.index.read().await;
        Ok(index
            .slugs
            .get(slug)
            .and_then(|id| index.by_id.get(id))
            .cloned())
    }
}
