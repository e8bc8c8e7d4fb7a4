/// Configuration for the publish pipeline
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Uploads running at once while resolving a draft (default: 4)
    pub upload_concurrency: usize,

    /// Slug candidates tried before giving up (default: 10)
    pub max_slug_attempts: u32,

    /// Path hint prefix for uploaded media; the post id is appended (default: "posts")
    pub media_prefix: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: 4,
            max_slug_attempts: 10,
            media_prefix: "posts".to_string(),
        }
    }
}

impl PublishConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set upload concurrency; clamped to at least one
    pub fn with_upload_concurrency(mut self, limit: usize) -> Self {
        self.upload_concurrency = limit.max(1);
        self
    }

    /// Set the slug attempt bound; clamped to at least one
    pub fn with_max_slug_attempts(mut self, attempts: u32) -> Self {
        self.max_slug_attempts = attempts.max(1);
        self
    }

    /// Set media path prefix
    pub fn with_media_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.media_prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Path hint used for a post's media
    pub fn media_hint(&self, post_id: &str) -> String {
        if self.media_prefix.is_empty() {
            post_id.to_string()
        } else {
            format!("{}/{}", self.media_prefix, post_id)
        }
    }
}
