use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use dog_blob::BlobCtx;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::coordinator::PublishCoordinator;
use crate::error::{PublishError, RegistryError};
use crate::record::{DraftInput, PublishedDocument};
use crate::registry::{MediaKey, TempMediaRegistry};
use crate::state::PublishState;

/// One editing session: the staged media plus what the last publish produced.
///
/// Dropping the session releases everything still staged.
#[derive(Debug)]
pub struct DraftSession {
    id: String,
    registry: TempMediaRegistry,
    state: PublishState,
    post_id: Option<String>,
    slug: Option<String>,
}

impl Default for DraftSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftSession {
    pub fn new() -> Self {
        Self {
            id: format!("draft_{}", Uuid::new_v4().simple()),
            registry: TempMediaRegistry::new(),
            state: PublishState::Draft,
            post_id: None,
            slug: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    pub fn registry(&self) -> &TempMediaRegistry {
        &self.registry
    }

    pub fn post_id(&self) -> Option<&str> {
        self.post_id.as_deref()
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn stage(&mut self, bytes: Bytes, mime: &str) -> Result<MediaKey, RegistryError> {
        self.registry.register(bytes, mime)
    }

    pub fn stage_with_key(&mut self, key: &str, bytes: Bytes, mime: &str) -> Result<MediaKey, RegistryError> {
        self.registry.register_with_key(key, bytes, mime)
    }

    /// Publish through `coordinator`, uploading as `ctx`. Later publishes of
    /// the same session update the same post and keep its slug.
    pub async fn publish(
        &mut self,
        coordinator: &PublishCoordinator,
        ctx: &BlobCtx,
        mut draft: DraftInput,
    ) -> Result<PublishedDocument, PublishError> {
        if draft.id.is_none() {
            draft.id = self.post_id.clone();
        }
        let doc = coordinator
            .publish_tracked(ctx, &draft, &mut self.registry, self.slug.as_deref(), &mut self.state)
            .await?;
        self.post_id = Some(doc.id.clone());
        self.slug = Some(doc.slug.clone());
        Ok(doc)
    }

    /// Abandon staged media. Nothing durable is touched.
    pub fn cancel(&mut self) -> usize {
        self.state.restart();
        self.registry.clear()
    }
}

impl Drop for DraftSession {
    fn drop(&mut self) {
        let released = self.registry.clear();
        if released > 0 {
            debug!(draft = %self.id, released, "draft dropped with staged media");
        }
    }
}

/// Shared handle to a session that refuses overlapping publishes.
#[derive(Debug)]
pub struct DraftHandle {
    id: String,
    pending: AtomicBool,
    session: Mutex<DraftSession>,
}

impl DraftHandle {
    pub fn new(session: DraftSession) -> Self {
        Self {
            id: session.id().to_string(),
            pending: AtomicBool::new(false),
            session: Mutex::new(session),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Mark a publish as running. `None` when one already is.
    pub fn begin_publish(&self) -> Option<PendingPublish<'_>> {
        self.pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PendingPublish { flag: &self.pending })
    }

    pub async fn session(&self) -> MutexGuard<'_, DraftSession> {
        self.session.lock().await
    }

    /// Stage media unless a publish is resolving the registry right now.
    pub async fn stage(&self, bytes: Bytes, mime: &str) -> Result<MediaKey, PublishError> {
        if self.is_pending() {
            return Err(PublishError::PublishInFlight(self.id.clone()));
        }
        Ok(self.session().await.stage(bytes, mime)?)
    }
}

impl From<DraftSession> for DraftHandle {
    fn from(session: DraftSession) -> Self {
        Self::new(session)
    }
}

/// Clears the pending flag when the publish ends, however it ends.
#[derive(Debug)]
pub struct PendingPublish<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PendingPublish<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_publish_at_a_time() {
        let handle = DraftHandle::new(DraftSession::new());

        let first = handle.begin_publish().unwrap();
        assert!(handle.is_pending());
        assert!(handle.begin_publish().is_none());

        drop(first);
        assert!(!handle.is_pending());
        assert!(handle.begin_publish().is_some());
    }

    #[tokio::test]
    async fn staging_is_refused_while_publishing() {
        let handle = DraftHandle::new(DraftSession::new());
        let _pending = handle.begin_publish().unwrap();

        let err = handle.stage(Bytes::from_static(b"x"), "image/png").await.unwrap_err();
        assert_eq!(err, PublishError::PublishInFlight(handle.id().to_string()));
    }

    #[test]
    fn cancel_releases_staged_media() {
        let mut session = DraftSession::new();
        session.stage(Bytes::from_static(b"x"), "image/png").unwrap();
        session.stage(Bytes::from_static(b"y"), "image/png").unwrap();

        assert_eq!(session.cancel(), 2);
        assert!(session.registry().is_empty());
        assert_eq!(session.cancel(), 0);
    }

    #[test]
    fn cancel_after_an_interrupted_publish_resets_the_state() {
        let mut session = DraftSession::new();
        session.stage(Bytes::from_static(b"x"), "image/png").unwrap();
        session.state = PublishState::ResolvingMedia;

        assert_eq!(session.cancel(), 1);
        assert_eq!(session.state(), PublishState::Draft);
    }
}
