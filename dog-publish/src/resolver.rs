use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dog_blob::{BlobAdapter, BlobCtx, BlobPut, BlobReceipt};
use dog_content::Document;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::UploadError;
use crate::record::ValidatedDraft;
use crate::registry::TempMediaRegistry;

/// A document whose staged images now point at durable URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub document: Document,
    pub uploads: Vec<BlobReceipt>,
}

impl ResolvedDocument {
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Uploads staged media and swaps placeholders for durable URLs.
///
/// Sources the registry does not hold are left untouched. Identical keys are
/// uploaded once no matter how often they appear.
pub struct UploadResolver {
    blobs: Arc<BlobAdapter>,
    concurrency: usize,
}

impl UploadResolver {
    pub fn new(blobs: Arc<BlobAdapter>, concurrency: usize) -> Self {
        Self {
            blobs,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn blobs(&self) -> &BlobAdapter {
        &self.blobs
    }

    /// Resolve one document, storing its media under `path_hint` on behalf of `ctx`.
    pub async fn resolve(
        &self,
        ctx: &BlobCtx,
        doc: &Document,
        registry: &TempMediaRegistry,
        path_hint: &str,
    ) -> Result<ResolvedDocument, UploadError> {
        let (urls, uploads) = self.upload(ctx, doc.placeholders(), registry, path_hint).await?;
        let mut document = doc.clone();
        document.rewrite_image_sources(|src| urls.get(src).cloned());
        Ok(ResolvedDocument { document, uploads })
    }

    /// Resolve every locale tree and the cover image of a draft in one pass.
    pub async fn resolve_draft(
        &self,
        ctx: &BlobCtx,
        draft: &ValidatedDraft,
        registry: &TempMediaRegistry,
        path_hint: &str,
    ) -> Result<(ValidatedDraft, Vec<BlobReceipt>), UploadError> {
        let (urls, uploads) = self.upload(ctx, draft.placeholders(), registry, path_hint).await?;

        let mut resolved = draft.clone();
        for locale in resolved.locales.values_mut() {
            locale
                .content
                .rewrite_image_sources(|src| urls.get(src).cloned());
        }
        if let Some(url) = resolved.cover_image.as_deref().and_then(|src| urls.get(src)) {
            resolved.cover_image = Some(url.clone());
        }
        Ok((resolved, uploads))
    }

    /// Upload the staged subset of `placeholders`, at most `concurrency` at a time.
    ///
    /// Every upload runs to completion; the first failure in document order is
    /// reported. Successful uploads are content-addressed, so leaving them
    /// behind after a failure is harmless.
    async fn upload(
        &self,
        ctx: &BlobCtx,
        placeholders: Vec<&str>,
        registry: &TempMediaRegistry,
        path_hint: &str,
    ) -> Result<(HashMap<String, String>, Vec<BlobReceipt>), UploadError> {
        let mut seen = BTreeSet::new();
        let staged: Vec<_> = placeholders
            .into_iter()
            .filter(|key| seen.insert(*key))
            .filter_map(|key| registry.get(key).ok().map(|media| (key, media)))
            .collect();

        if staged.is_empty() {
            return Ok((HashMap::new(), Vec::new()));
        }
        debug!(
            actor = ctx.actor_id.as_deref().unwrap_or("-"),
            count = staged.len(),
            limit = self.concurrency,
            path_hint,
            "uploading staged media"
        );

        let puts: Vec<_> = staged
            .into_iter()
            .map(|(key, media)| {
                let put = BlobPut::new(media.mime.clone())
                    .with_path_hint(path_hint)
                    .with_filename(key.trim_start_matches(dog_content::PLACEHOLDER_SCHEME));
                let body = media.bytes.clone();
                let ctx = ctx.clone();
                async move { (key, self.blobs.put(ctx, put, body).await) }
            })
            .collect();
        let results: Vec<_> = stream::iter(puts)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut urls = HashMap::with_capacity(results.len());
        let mut uploads = Vec::with_capacity(results.len());
        let mut failure = None;
        for (key, result) in results {
            match result {
                Ok(receipt) => {
                    urls.insert(key.to_string(), receipt.url.clone());
                    uploads.push(receipt);
                }
                Err(err) => {
                    warn!(key, error = %err, "media upload failed");
                    failure.get_or_insert_with(|| UploadError::from_blob(key, err));
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok((urls, uploads)),
        }
    }
}
