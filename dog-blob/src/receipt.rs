use serde::{Deserialize, Serialize};

/// Receipt returned after a successful put
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobReceipt {
    /// Object key inside the store (`<path_hint>/<sha256>.<ext>`)
    pub key: String,

    /// Durable, publicly resolvable URL
    pub url: String,

    pub size_bytes: u64,
    pub content_type: String,

    /// Hex sha256 of the content
    pub checksum: String,

    /// True when identical content already lived at this key and nothing was written
    pub deduplicated: bool,

    pub stored_at: i64,
}

impl BlobReceipt {
    pub fn new(key: String, url: String, size_bytes: u64, content_type: String, checksum: String) -> Self {
        Self {
            key,
            url,
            size_bytes,
            content_type,
            checksum,
            deduplicated: false,
            stored_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn deduplicated(mut self) -> Self {
        self.deduplicated = true;
        self
    }
}
