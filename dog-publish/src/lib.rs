//! # dog-publish: from editor draft to durable post
//!
//! The publishing pipeline of DogRS. An author stages images while editing,
//! the editor references them with `tmp:` placeholders, and submitting the
//! draft runs three stages in order:
//!
//! 1. **Validate** every locale tree against the closed [`dog_content`] schema
//! 2. **Resolve** staged media through [`dog_blob`], swapping placeholders for durable URLs
//! 3. **Persist** the post atomically under a unique slug
//!
//! A failure in any stage writes nothing and keeps the staged media, so the
//! author can fix the draft and submit again.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dog_blob::{BlobAdapter, BlobConfig, MemoryBlobStore};
//! use dog_publish::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let blobs = Arc::new(BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default()));
//! let coordinator = PublishCoordinator::new(blobs, Arc::new(MemoryPostStore::new()), PublishConfig::default());
//! let service = PublishService::new(
//!     Arc::new(StaticTokenGate::new().with_token("t0k3n", "ada")),
//!     Arc::new(coordinator),
//! );
//!
//! let draft = DraftHandle::new(DraftSession::new());
//! let auth = AuthRequest::bearer("t0k3n");
//! let key = service
//!     .stage_media(&auth, &draft, bytes::Bytes::from_static(b"\x89PNG"), "image/png")
//!     .await
//!     .unwrap();
//!
//! let content = json!({ "type": "doc", "content": [
//!     { "type": "paragraph", "content": [{ "type": "text", "text": "Hi" }] },
//!     { "type": "image", "attrs": { "src": key.as_str() } }
//! ]});
//! let result = service.submit_draft(&auth, &draft, DraftInput::new("Hello World", content)).await;
//!
//! assert!(result.is_published());
//! assert_eq!(result.document.unwrap().slug, "hello-world");
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod draft;
pub mod error;
pub mod gate;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod slug;
pub mod state;
pub mod store;

pub use config::PublishConfig;
pub use coordinator::PublishCoordinator;
pub use draft::{DraftHandle, DraftSession, PendingPublish};
pub use error::{ErrorReport, PersistError, PublishError, RegistryError, UploadCause, UploadError};
pub use gate::{AuthRequest, AuthorCapability, JwtGate, SessionGate, StaticTokenGate};
pub use record::{DraftInput, LocaleDraft, LocalizedContent, PublishedDocument, ValidatedDraft};
pub use registry::{MediaKey, StagedMedia, TempMediaRegistry};
pub use resolver::{ResolvedDocument, UploadResolver};
pub use service::{PublishResult, PublishService, PublishStatus};
pub use slug::slugify;
pub use state::{FailureKind, PublishState};
pub use store::{MemoryPostStore, PostStore};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AuthRequest, DraftHandle, DraftInput, DraftSession, LocaleDraft, MemoryPostStore, PostStore,
        PublishConfig, PublishCoordinator, PublishError, PublishResult, PublishService,
        PublishedDocument, SessionGate, StaticTokenGate, TempMediaRegistry,
    };
}
