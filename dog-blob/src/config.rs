use std::time::Duration;

/// Configuration for blob operations
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size allowed for a single blob (safety guard)
    pub max_blob_bytes: u64,

    /// Base of the durable URLs handed back to callers, without trailing slash
    pub public_base_url: String,

    /// Upper bound on a single store put; exceeding it surfaces as `BlobError::Timeout`
    pub put_timeout: Duration,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: 25 * 1024 * 1024, // 25MB
            public_base_url: "http://127.0.0.1:3036/media".to_string(),
            put_timeout: Duration::from_secs(30),
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max blob size
    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    /// Set the durable URL base
    pub fn with_public_base_url<S: Into<String>>(mut self, base: S) -> Self {
        self.public_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-put timeout
    pub fn with_put_timeout(mut self, timeout: Duration) -> Self {
        self.put_timeout = timeout;
        self
    }
}
