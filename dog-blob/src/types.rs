use uuid::Uuid;

/// Context for blob operations (who is writing, which request)
#[derive(Debug, Clone)]
pub struct BlobCtx {
    pub actor_id: Option<String>,
    pub request_id: String,
}

impl BlobCtx {
    pub fn new() -> Self {
        Self {
            actor_id: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_actor<S: Into<String>>(mut self, actor_id: S) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }
}

impl Default for BlobCtx {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to store a blob
#[derive(Debug, Clone)]
pub struct BlobPut {
    pub content_type: String,
    /// Directory-like prefix the object key is derived under, e.g. `posts/p-1`.
    pub path_hint: String,
    pub filename: Option<String>,
}

impl BlobPut {
    pub fn new<S: Into<String>>(content_type: S) -> Self {
        Self {
            content_type: content_type.into(),
            path_hint: String::new(),
            filename: None,
        }
    }

    pub fn with_path_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.path_hint = hint.into();
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }
}
