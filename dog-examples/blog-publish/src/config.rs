use std::time::Duration;

use dog_blob::BlobConfig;
use dog_publish::PublishConfig;

/// Server settings, read from `BLOG_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub upload_concurrency: usize,
    pub max_slug_attempts: u32,
    pub upload_timeout_secs: u64,
    pub max_media_mb: u64,
    /// Drafts untouched this long are released with their staged media.
    pub draft_idle_secs: u64,
    /// `token=subject` pairs, comma separated.
    pub auth_tokens: String,
    /// When set, editors authenticate with HS256 JWTs instead of static tokens.
    pub jwt_secret: Option<String>,
    /// Required `iss` claim, if any.
    pub jwt_issuer: Option<String>,
    /// Role a JWT must carry to edit.
    pub jwt_role: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let publish = PublishConfig::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 3036,
            public_base_url: "http://127.0.0.1:3036/media".to_string(),
            upload_concurrency: publish.upload_concurrency,
            max_slug_attempts: publish.max_slug_attempts,
            upload_timeout_secs: 30,
            max_media_mb: 25,
            draft_idle_secs: 3600,
            auth_tokens: String::new(),
            jwt_secret: None,
            jwt_issuer: None,
            jwt_role: "author".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env_var_or("BLOG_HOST", defaults.host);
        let port = env_var_or("BLOG_PORT", defaults.port);
        Self {
            public_base_url: env_var_or("BLOG_PUBLIC_BASE_URL", format!("http://{host}:{port}/media")),
            upload_concurrency: env_var_or("BLOG_UPLOAD_CONCURRENCY", defaults.upload_concurrency),
            max_slug_attempts: env_var_or("BLOG_MAX_SLUG_ATTEMPTS", defaults.max_slug_attempts),
            upload_timeout_secs: env_var_or("BLOG_UPLOAD_TIMEOUT_SECS", defaults.upload_timeout_secs),
            max_media_mb: env_var_or("BLOG_MAX_MEDIA_MB", defaults.max_media_mb),
            draft_idle_secs: env_var_or("BLOG_DRAFT_IDLE_SECS", defaults.draft_idle_secs),
            auth_tokens: env_var_or("BLOG_AUTH_TOKENS", defaults.auth_tokens),
            jwt_secret: optional_env("BLOG_JWT_SECRET"),
            jwt_issuer: optional_env("BLOG_JWT_ISSUER"),
            jwt_role: env_var_or("BLOG_JWT_ROLE", defaults.jwt_role),
            host,
            port,
        }
    }

    pub fn with_auth_tokens<S: Into<String>>(mut self, tokens: S) -> Self {
        self.auth_tokens = tokens.into();
        self
    }

    pub fn with_jwt_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn with_jwt_issuer<S: Into<String>>(mut self, issuer: S) -> Self {
        self.jwt_issuer = Some(issuer.into());
        self
    }

    pub fn with_jwt_role<S: Into<String>>(mut self, role: S) -> Self {
        self.jwt_role = role.into();
        self
    }

    pub fn with_draft_idle_secs(mut self, secs: u64) -> Self {
        self.draft_idle_secs = secs;
        self
    }

    pub fn draft_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.draft_idle_secs)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_media_bytes(&self) -> usize {
        (self.max_media_mb * 1024 * 1024) as usize
    }

    pub fn blob_config(&self) -> BlobConfig {
        BlobConfig::new()
            .with_public_base_url(self.public_base_url.clone())
            .with_max_blob_bytes(self.max_media_mb * 1024 * 1024)
            .with_put_timeout(Duration::from_secs(self.upload_timeout_secs.max(1)))
    }

    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig::new()
            .with_upload_concurrency(self.upload_concurrency)
            .with_max_slug_attempts(self.max_slug_attempts)
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Debug,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}
