use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::{BlobError, BlobResult};

/// Core blob storage operations - must be implemented by all storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob under `key`. Writing identical bytes to an existing key is a no-op.
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> BlobResult<PutResult>;

    /// Fetch a blob
    async fn get(&self, key: &str) -> BlobResult<GetResult>;

    /// Get blob metadata without content; `Ok(None)` when absent
    async fn head(&self, key: &str) -> BlobResult<Option<ObjectHead>>;

    /// Delete a blob
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
    pub etag: Option<String>,
}

/// Result of a get operation
#[derive(Debug, Clone)]
pub struct GetResult {
    pub body: Bytes,
    pub content_type: String,
}

/// Metadata about a blob
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: String,
    pub etag: Option<String>,
}

/// Strategy for generating blob keys
pub trait BlobKeyStrategy: Send + Sync {
    /// Key for `body` stored under `path_hint`
    fn object_key(&self, path_hint: &str, body: &[u8], content_type: &str) -> BlobResult<String>;
}

/// Content-addressed keys: `<path_hint>/<sha256>.<ext>`.
///
/// Same bytes under the same hint always map to the same key, which is what
/// makes re-uploads idempotent.
#[derive(Debug, Clone, Default)]
pub struct ContentAddressedKeys;

impl ContentAddressedKeys {
    pub fn checksum(body: &[u8]) -> String {
        hex::encode(Sha256::digest(body))
    }

    pub fn extension_for(content_type: &str) -> &'static str {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/avif" => "avif",
            "image/svg+xml" => "svg",
            "video/mp4" => "mp4",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }

    fn clean_hint(path_hint: &str) -> BlobResult<String> {
        let segments: Vec<&str> = path_hint
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        for segment in &segments {
            if *segment == "." || *segment == ".." {
                return Err(BlobError::invalid(format!("path hint `{path_hint}` escapes its prefix")));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            {
                return Err(BlobError::invalid(format!(
                    "path hint segment `{segment}` has unsupported characters"
                )));
            }
        }
        Ok(segments.join("/"))
    }
}

impl BlobKeyStrategy for ContentAddressedKeys {
    fn object_key(&self, path_hint: &str, body: &[u8], content_type: &str) -> BlobResult<String> {
        let prefix = Self::clean_hint(path_hint)?;
        let name = format!("{}.{}", Self::checksum(body), Self::extension_for(content_type));
        Ok(if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_hint_same_key() {
        let keys = ContentAddressedKeys;
        let a = keys.object_key("posts/p-1", b"png-bytes", "image/png").unwrap();
        let b = keys.object_key("/posts/p-1/", b"png-bytes", "image/png").unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("posts/p-1/"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn hint_and_content_both_change_the_key() {
        let keys = ContentAddressedKeys;
        let base = keys.object_key("posts/p-1", b"one", "image/png").unwrap();
        assert_ne!(base, keys.object_key("posts/p-2", b"one", "image/png").unwrap());
        assert_ne!(base, keys.object_key("posts/p-1", b"two", "image/png").unwrap());
    }

    #[test]
    fn hint_cannot_escape_or_inject() {
        let keys = ContentAddressedKeys;
        assert!(keys.object_key("posts/../secrets", b"x", "image/png").is_err());
        assert!(keys.object_key("posts/a b", b"x", "image/png").is_err());
        assert_eq!(
            keys.object_key("", b"x", "text/plain").unwrap(),
            format!("{}.bin", ContentAddressedKeys::checksum(b"x"))
        );
    }

    #[test]
    fn extension_ignores_parameters_and_case() {
        assert_eq!(ContentAddressedKeys::extension_for("Image/JPEG; q=0.9"), "jpg");
        assert_eq!(ContentAddressedKeys::extension_for("application/x-unknown"), "bin");
    }
}
