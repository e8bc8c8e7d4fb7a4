//! # dog-blob: content-addressed blob storage
//!
//! `dog-blob` is the storage collaborator of the DogRS publishing pipeline. A put
//! takes bytes, a content type and a path hint, and hands back a durable URL.
//!
//! ## Key Features
//!
//! - **Content-addressed keys**: `<path_hint>/<sha256>.<ext>`, so storing the same bytes
//!   twice is a no-op rather than a duplicate
//! - **Storage agnostic**: anything implementing [`BlobStore`] (S3, filesystem, memory)
//! - **Guard rails**: max blob size and a per-put timeout, both surfaced as [`BlobError`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use dog_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let blobs = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default());
//!
//! let put = BlobPut::new("image/png").with_path_hint("posts/p-1");
//! let receipt = blobs.put(BlobCtx::new(), put, bytes::Bytes::from_static(b"\x89PNG")).await?;
//!
//! assert!(receipt.url.contains("posts/p-1/"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Upload resolver │  ← decides what to upload
//! ├─────────────────┤
//! │   BlobAdapter   │  ← keys, limits, timeouts, URLs
//! ├─────────────────┤
//! │   BlobStore     │  ← storage primitives
//! └─────────────────┘
//! ```

pub mod adapter;
mod config;
mod error;
mod memory_store;
mod receipt;
pub mod store;
mod types;

pub use adapter::BlobAdapter;
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use memory_store::MemoryBlobStore;
pub use receipt::BlobReceipt;
pub use store::{BlobKeyStrategy, BlobStore, ContentAddressedKeys, GetResult, ObjectHead, PutResult};
pub use types::{BlobCtx, BlobPut};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobCtx, BlobError, BlobPut, BlobReceipt, BlobResult, BlobStore,
        MemoryBlobStore,
    };
}
