use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use dog_content::{is_placeholder, PLACEHOLDER_SCHEME};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::RegistryError;

/// Temporary reference to staged media, always `tmp:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaKey(String);

impl MediaKey {
    pub fn generate() -> Self {
        Self(format!("{PLACEHOLDER_SCHEME}{}", Uuid::new_v4().simple()))
    }

    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let raw = raw.trim();
        let id = raw.strip_prefix(PLACEHOLDER_SCHEME).unwrap_or_default();
        if !is_placeholder(raw) || id.is_empty() {
            return Err(RegistryError::Invalid(format!(
                "media key `{raw}` must look like `{PLACEHOLDER_SCHEME}<id>`"
            )));
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_')) {
            return Err(RegistryError::Invalid(format!("media key `{raw}` has unsupported characters")));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MediaKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MediaKey {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MediaKey> for String {
    fn from(key: MediaKey) -> Self {
        key.0
    }
}

/// Bytes staged for upload together with their declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedMedia {
    pub bytes: Bytes,
    pub mime: String,
}

impl StagedMedia {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Media picked in the editor but not uploaded yet, owned by one draft session.
///
/// Registration and clearing need `&mut self`; resolution only borrows it, so
/// the registry cannot change underneath an in-progress upload.
#[derive(Debug, Default)]
pub struct TempMediaRegistry {
    entries: HashMap<MediaKey, StagedMedia>,
}

impl TempMediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage bytes and hand back a fresh, unique placeholder key.
    pub fn register(&mut self, bytes: Bytes, mime: &str) -> Result<MediaKey, RegistryError> {
        let key = MediaKey::generate();
        self.insert(key.clone(), bytes, mime)?;
        Ok(key)
    }

    /// Stage bytes under a key the editor already placed in the document.
    pub fn register_with_key(&mut self, key: &str, bytes: Bytes, mime: &str) -> Result<MediaKey, RegistryError> {
        let key = MediaKey::parse(key)?;
        if self.entries.contains_key(&key) {
            return Err(RegistryError::Invalid(format!("media key `{key}` is already staged")));
        }
        self.insert(key.clone(), bytes, mime)?;
        Ok(key)
    }

    fn insert(&mut self, key: MediaKey, bytes: Bytes, mime: &str) -> Result<(), RegistryError> {
        if bytes.is_empty() {
            return Err(RegistryError::Invalid("staged media is empty".into()));
        }
        let mime = mime.trim();
        if mime.is_empty() || !mime.contains('/') {
            return Err(RegistryError::Invalid(format!("`{mime}` is not a media type")));
        }
        debug!(key = %key, size = bytes.len(), mime, "media staged");
        self.entries.insert(
            key,
            StagedMedia {
                bytes,
                mime: mime.to_string(),
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&StagedMedia, RegistryError> {
        self.entries
            .get(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop everything staged. Idempotent; returns how many entries were released.
    pub fn clear(&mut self) -> usize {
        let released = self.entries.len();
        self.entries.clear();
        if released > 0 {
            debug!(released, "staged media released");
        }
        released
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(StagedMedia::size).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MediaKey> {
        self.entries.keys()
    }
}
