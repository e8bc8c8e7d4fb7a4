use std::sync::Arc;

use chrono::Utc;
use dog_blob::{BlobAdapter, BlobCtx};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PublishConfig;
use crate::error::{PersistError, PublishError, UploadError};
use crate::record::{DraftInput, PublishedDocument, ValidatedDraft};
use crate::registry::TempMediaRegistry;
use crate::resolver::UploadResolver;
use crate::slug;
use crate::state::PublishState;
use crate::store::PostStore;

/// Runs a draft through validate, resolve media, persist.
///
/// A failure at any stage leaves the store untouched and the registry intact,
/// so the same draft can be submitted again.
pub struct PublishCoordinator {
    resolver: UploadResolver,
    store: Arc<dyn PostStore>,
    config: PublishConfig,
}

impl PublishCoordinator {
    pub fn new(blobs: Arc<BlobAdapter>, store: Arc<dyn PostStore>, config: PublishConfig) -> Self {
        Self {
            resolver: UploadResolver::new(blobs, config.upload_concurrency),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn PostStore> {
        &self.store
    }

    pub fn resolver(&self) -> &UploadResolver {
        &self.resolver
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Publish a draft. `existing_slug` pins the slug of a post being edited.
    pub async fn publish(
        &self,
        draft: &DraftInput,
        registry: &mut TempMediaRegistry,
        existing_slug: Option<&str>,
    ) -> Result<PublishedDocument, PublishError> {
        let mut state = PublishState::Draft;
        self.publish_tracked(&BlobCtx::new(), draft, registry, existing_slug, &mut state)
            .await
    }

    /// Like [`publish`](Self::publish), recording each stage in `state` and
    /// uploading on behalf of `ctx`.
    pub async fn publish_tracked(
        &self,
        ctx: &BlobCtx,
        draft: &DraftInput,
        registry: &mut TempMediaRegistry,
        existing_slug: Option<&str>,
        state: &mut PublishState,
    ) -> Result<PublishedDocument, PublishError> {
        state.restart();
        let result = self.run(ctx, draft, registry, existing_slug, state).await;
        match &result {
            Ok(doc) => info!(id = %doc.id, slug = %doc.slug, "post published"),
            Err(err) => {
                if let Some(kind) = err.failure_kind() {
                    state.enter(PublishState::Failed(kind));
                }
                warn!(state = %state, error = %err, "publish failed");
            }
        }
        result
    }

    async fn run(
        &self,
        ctx: &BlobCtx,
        draft: &DraftInput,
        registry: &mut TempMediaRegistry,
        existing_slug: Option<&str>,
        state: &mut PublishState,
    ) -> Result<PublishedDocument, PublishError> {
        state.enter(PublishState::Validating);
        let validated = draft.validate()?;

        state.enter(PublishState::ResolvingMedia);
        let id = validated
            .id
            .clone()
            .unwrap_or_else(|| format!("post_{}", Uuid::new_v4().simple()));
        let (resolved, uploads) = self
            .resolver
            .resolve_draft(ctx, &validated, registry, &self.config.media_hint(&id))
            .await?;
        ensure_durable(&resolved)?;
        debug!(id = %id, uploads = uploads.len(), "media resolved");

        state.enter(PublishState::Persisting);
        let doc = self.persist(id, resolved, existing_slug).await?;

        registry.clear();
        state.enter(PublishState::Published);
        Ok(doc)
    }

    async fn persist(
        &self,
        id: String,
        draft: ValidatedDraft,
        existing_slug: Option<&str>,
    ) -> Result<PublishedDocument, PublishError> {
        let previous = self.store.get(&id).await?;
        let pinned = existing_slug
            .or(previous.as_ref().map(|p| p.slug.as_str()))
            .map(slug::slugify);
        let is_pinned = pinned.is_some();
        let base = pinned.unwrap_or_else(|| slug::slugify(draft.title()));

        let now = Utc::now();
        let mut doc = PublishedDocument {
            id,
            slug: base.clone(),
            default_locale: draft.default_locale,
            locales: draft.locales,
            cover_image: draft.cover_image,
            tags: draft.tags,
            published: draft.published,
            created_at: previous.map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
        };

        // A published post keeps its URL; only fresh posts walk the suffixes.
        if is_pinned {
            self.store.upsert(&doc).await?;
            return Ok(doc);
        }

        let attempts = self.config.max_slug_attempts;
        for attempt in 1..=attempts {
            doc.slug = slug::candidate(&base, attempt);
            match self.store.upsert(&doc).await {
                Ok(()) => return Ok(doc),
                Err(PersistError::SlugConflict { slug }) => {
                    debug!(slug = %slug, attempt, "slug taken, trying the next one");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(PersistError::SlugConflictExhausted { base, attempts }.into())
    }
}

fn ensure_durable(draft: &ValidatedDraft) -> Result<(), UploadError> {
    match draft.placeholders().first() {
        Some(key) => Err(UploadError::missing(*key)),
        None => Ok(()),
    }
}
