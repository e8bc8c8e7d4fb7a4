use std::sync::Arc;

use bytes::Bytes;
use dog_blob::BlobCtx;
use serde::Serialize;
use tracing::{info, warn};

use crate::coordinator::PublishCoordinator;
use crate::draft::DraftHandle;
use crate::error::{ErrorReport, PublishError};
use crate::gate::{AuthRequest, AuthorCapability, SessionGate};
use crate::record::{DraftInput, PublishedDocument};
use crate::registry::MediaKey;
use crate::state::PublishState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    Failed,
    Rejected,
}

/// Outcome of a submission, shaped for the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishResult {
    pub status: PublishStatus,
    pub state: PublishState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<PublishedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    #[serde(skip)]
    pub cause: Option<PublishError>,
}

impl PublishResult {
    fn published(document: PublishedDocument) -> Self {
        Self {
            status: PublishStatus::Published,
            state: PublishState::Published,
            document: Some(document),
            error: None,
            cause: None,
        }
    }

    fn failed(state: PublishState, err: PublishError) -> Self {
        let status = if err.failure_kind().is_some() {
            PublishStatus::Failed
        } else {
            PublishStatus::Rejected
        };
        Self {
            status,
            state,
            document: None,
            error: Some(err.report()),
            cause: Some(err),
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Published
    }

    pub fn into_result(self) -> Result<PublishedDocument, PublishError> {
        match (self.document, self.cause) {
            (Some(doc), _) => Ok(doc),
            (None, Some(err)) => Err(err),
            (None, None) => Err(PublishError::Unauthorized),
        }
    }
}

/// Editor entry points. Every call passes the session gate first.
pub struct PublishService {
    gate: Arc<dyn SessionGate>,
    coordinator: Arc<PublishCoordinator>,
}

impl PublishService {
    pub fn new(gate: Arc<dyn SessionGate>, coordinator: Arc<PublishCoordinator>) -> Self {
        Self { gate, coordinator }
    }

    pub fn coordinator(&self) -> &PublishCoordinator {
        &self.coordinator
    }

    pub fn authorize(&self, auth: &AuthRequest) -> Result<AuthorCapability, PublishError> {
        self.gate.authorize(auth).ok_or_else(|| {
            warn!("editor call without author rights");
            PublishError::Unauthorized
        })
    }

    /// Validate, upload staged media, persist. Never panics on bad input; every
    /// failure comes back inside the result.
    pub async fn submit_draft(&self, auth: &AuthRequest, handle: &DraftHandle, raw: DraftInput) -> PublishResult {
        let author = match self.authorize(auth) {
            Ok(author) => author,
            Err(err) => return PublishResult::failed(PublishState::Draft, err),
        };

        let Some(_pending) = handle.begin_publish() else {
            return PublishResult::failed(
                PublishState::Draft,
                PublishError::PublishInFlight(handle.id().to_string()),
            );
        };

        let ctx = BlobCtx::new().with_actor(author.subject.clone());
        let mut session = handle.session().await;
        match session.publish(&self.coordinator, &ctx, raw).await {
            Ok(doc) => {
                info!(author = %author.subject, draft = %handle.id(), slug = %doc.slug, "draft submitted");
                PublishResult::published(doc)
            }
            Err(err) => PublishResult::failed(session.state(), err),
        }
    }

    /// Drop staged media for a draft. Returns how many entries were released.
    pub async fn cancel_draft(&self, auth: &AuthRequest, handle: &DraftHandle) -> Result<usize, PublishError> {
        self.authorize(auth)?;
        if handle.is_pending() {
            return Err(PublishError::PublishInFlight(handle.id().to_string()));
        }
        Ok(handle.session().await.cancel())
    }

    /// Stage a media payload for a draft and return its placeholder.
    pub async fn stage_media(
        &self,
        auth: &AuthRequest,
        handle: &DraftHandle,
        bytes: Bytes,
        mime: &str,
    ) -> Result<MediaKey, PublishError> {
        self.authorize(auth)?;
        handle.stage(bytes, mime).await
    }
}
