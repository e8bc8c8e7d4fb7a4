use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use dog_content::{is_placeholder, Document, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Locale used when a draft does not name one.
pub const DEFAULT_LOCALE: &str = "en";

/// Length of the description derived from body text when none is given.
pub const EXCERPT_CHARS: usize = 160;
const MAX_ID_LEN: usize = 128;

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_published() -> bool {
    true
}

/// What the editor submits. `content` is the raw tree; nothing here is trusted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftInput {
    /// Set when editing an existing post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<String, LocaleDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Default for DraftInput {
    fn default() -> Self {
        Self {
            id: None,
            locale: default_locale(),
            title: String::new(),
            description: None,
            content: Value::Null,
            translations: BTreeMap::new(),
            tags: Vec::new(),
            cover_image: None,
            published: true,
        }
    }
}

impl DraftInput {
    pub fn new<T: Into<String>>(title: T, content: Value) -> Self {
        Self {
            title: title.into(),
            content,
            ..Self::default()
        }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_translation<S: Into<String>>(mut self, locale: S, translation: LocaleDraft) -> Self {
        self.translations.insert(locale.into(), translation);
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_cover_image<S: Into<String>>(mut self, src: S) -> Self {
        self.cover_image = Some(src.into());
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    /// Check every field and parse every content tree.
    pub fn validate(&self) -> Result<ValidatedDraft, ValidationError> {
        let id = self.id.as_deref().map(check_post_id).transpose()?;

        let default_locale = check_locale(&self.locale, "$.locale")?;
        let mut locales = BTreeMap::new();
        locales.insert(
            default_locale.clone(),
            LocalizedContent::from_raw(&self.title, self.description.as_deref(), &self.content, "$")?,
        );

        for (locale, translation) in &self.translations {
            let path = format!("$.translations.{locale}");
            let locale = check_locale(locale, &path)?;
            if locales.contains_key(&locale) {
                return Err(ValidationError::invalid_field(
                    path,
                    format!("locale `{locale}` is given twice"),
                ));
            }
            let content = LocalizedContent::from_raw(
                &translation.title,
                translation.description.as_deref(),
                &translation.content,
                &path,
            )?;
            locales.insert(locale, content);
        }

        let tags = self
            .tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        let cover_image = match self.cover_image.as_deref().map(str::trim) {
            Some("") => {
                return Err(ValidationError::invalid_field(
                    "$.cover_image",
                    "cover image must not be blank",
                ))
            }
            Some(src) => Some(src.to_string()),
            None => None,
        };

        Ok(ValidatedDraft {
            id,
            default_locale,
            locales,
            tags,
            cover_image,
            published: self.published,
        })
    }
}

/// Another language's variant of the same post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocaleDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Value,
}

impl LocaleDraft {
    pub fn new<T: Into<String>>(title: T, content: Value) -> Self {
        Self {
            title: title.into(),
            description: None,
            content,
        }
    }
}

/// Post ids end up in media paths, so they share the placeholder alphabet.
fn check_post_id(id: &str) -> Result<String, ValidationError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::invalid_field("$.id", "id must not be blank"));
    }
    let valid = id.len() <= MAX_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if !valid {
        return Err(ValidationError::invalid_field(
            "$.id",
            format!("`{id}` is not a post id; use up to {MAX_ID_LEN} letters, digits, `-` or `_`"),
        ));
    }
    Ok(id.to_string())
}

fn check_locale(locale: &str, path: &str) -> Result<String, ValidationError> {
    let locale = locale.trim();
    let valid = !locale.is_empty()
        && locale.len() <= 35
        && locale.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !locale.starts_with('-')
        && !locale.ends_with('-');
    if !valid {
        return Err(ValidationError::invalid_field(
            path,
            format!("`{locale}` is not a locale tag"),
        ));
    }
    Ok(locale.to_string())
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    match cut.rfind(' ') {
        Some(at) if at > 0 => format!("{}…", &cut[..at]),
        _ => format!("{cut}…"),
    }
}

/// Title, description and body for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedContent {
    pub title: String,
    pub description: String,
    pub content: Document,
}

impl LocalizedContent {
    fn from_raw(
        title: &str,
        description: Option<&str>,
        content: &Value,
        path: &str,
    ) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::invalid_field(
                format!("{path}.title"),
                "title must not be empty",
            ));
        }
        let content = Document::from_value(content).map_err(|e| e.within(&format!("{path}.content")))?;
        let description = match description.map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => excerpt(&content.plain_text()),
        };

        Ok(Self {
            title: title.to_string(),
            description,
            content,
        })
    }
}

/// A draft whose fields and trees passed validation. Image sources may still be placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub id: Option<String>,
    pub default_locale: String,
    pub locales: BTreeMap<String, LocalizedContent>,
    pub tags: BTreeSet<String>,
    pub cover_image: Option<String>,
    pub published: bool,
}

impl ValidatedDraft {
    pub fn title(&self) -> &str {
        self.locales
            .get(&self.default_locale)
            .map(|c| c.title.as_str())
            .unwrap_or_default()
    }

    /// Placeholder sources across every locale tree and the cover, first occurrence order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.locales
            .values()
            .flat_map(|locale| locale.content.placeholders())
            .chain(self.cover_image.as_deref().filter(|src| is_placeholder(src)))
            .filter(|src| seen.insert(*src))
            .collect()
    }
}

/// The durable, reader-facing post. Never contains a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedDocument {
    pub id: String,
    pub slug: String,
    pub default_locale: String,
    pub locales: BTreeMap<String, LocalizedContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublishedDocument {
    pub fn title(&self) -> &str {
        self.localized(&self.default_locale)
            .map(|c| c.title.as_str())
            .unwrap_or_default()
    }

    pub fn localized(&self, locale: &str) -> Option<&LocalizedContent> {
        self.locales.get(locale)
    }

    /// The requested locale, or the default one when it is missing.
    pub fn localized_or_default(&self, locale: &str) -> Option<&LocalizedContent> {
        self.localized(locale)
            .or_else(|| self.localized(&self.default_locale))
    }

    pub fn media_urls(&self) -> Vec<&str> {
        self.locales
            .values()
            .flat_map(|locale| locale.content.images())
            .filter_map(|node| node.src())
            .chain(self.cover_image.as_deref())
            .collect()
    }

    pub fn has_placeholders(&self) -> bool {
        self.media_urls().into_iter().any(is_placeholder)
    }
}

#[cfg(test)]
mod tests {
    use dog_content::ValidationReason;
    use serde_json::json;

    use super::*;

    fn body(text: &str) -> Value {
        json!({ "type": "doc", "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": text }] }
        ]})
    }

    #[test]
    fn empty_title_is_an_invalid_field() {
        let err = DraftInput::new("   ", body("x")).validate().unwrap_err();
        assert_eq!(err.reason, ValidationReason::InvalidField);
        assert_eq!(err.path, "$.title");
    }

    #[test]
    fn content_errors_point_into_the_draft() {
        let bad = json!({ "type": "doc", "content": [{ "type": "video" }] });
        let err = DraftInput::new("Hi", body("x"))
            .with_translation("de", LocaleDraft::new("Hallo", bad))
            .validate()
            .unwrap_err();

        assert_eq!(err.reason, ValidationReason::UnknownNodeType);
        assert!(err.path.starts_with("$.translations.de.content"), "{}", err.path);
    }

    #[test]
    fn missing_content_is_malformed() {
        let err = DraftInput::new("Hi", Value::Null).validate().unwrap_err();
        assert_eq!(err.reason, ValidationReason::MalformedTree);
        assert!(err.path.starts_with("$.content"));
    }

    #[test]
    fn default_locale_cannot_be_translated_again() {
        let err = DraftInput::new("Hi", body("x"))
            .with_translation("en", LocaleDraft::new("Hi again", body("y")))
            .validate()
            .unwrap_err();
        assert_eq!(err.path, "$.translations.en");
    }

    #[test]
    fn description_falls_back_to_an_excerpt() {
        let long = "word ".repeat(100);
        let draft = DraftInput::new("Hi", body(&long)).validate().unwrap();
        let description = &draft.locales["en"].description;

        assert!(description.ends_with('…'));
        assert!(description.chars().count() <= EXCERPT_CHARS + 1);

        let given = DraftInput::new("Hi", body("x"))
            .with_description("  Short  ")
            .validate()
            .unwrap();
        assert_eq!(given.locales["en"].description, "Short");
    }

    #[test]
    fn tags_are_normalised_into_a_set() {
        let draft = DraftInput::new("Hi", body("x"))
            .with_tag("Rust")
            .with_tag(" rust ")
            .with_tag("")
            .with_tag("Web")
            .validate()
            .unwrap();
        assert_eq!(draft.tags.into_iter().collect::<Vec<_>>(), vec!["rust", "web"]);
    }

    #[test]
    fn placeholders_are_collected_across_locales_once() {
        let with_image = |src: &str| {
            json!({ "type": "doc", "content": [{ "type": "image", "attrs": { "src": src } }] })
        };
        let draft = DraftInput::new("Hi", with_image("tmp:a"))
            .with_translation("de", LocaleDraft::new("Hallo", with_image("tmp:a")))
            .with_translation("fr", LocaleDraft::new("Salut", with_image("https://cdn/x.png")))
            .with_cover_image("tmp:cover")
            .validate()
            .unwrap();

        assert_eq!(draft.placeholders(), vec!["tmp:a", "tmp:cover"]);
    }

    #[test]
    fn post_ids_must_be_path_safe() {
        for bad in ["my post", "../../etc", "a/b", "   "] {
            let err = DraftInput::new("Hi", body("x")).with_id(bad).validate().unwrap_err();
            assert_eq!(err.reason, ValidationReason::InvalidField, "{bad}");
            assert_eq!(err.path, "$.id");
        }
        let draft = DraftInput::new("Hi", body("x")).with_id(" post_42-a ").validate().unwrap();
        assert_eq!(draft.id.as_deref(), Some("post_42-a"));
    }

    #[test]
    fn unknown_draft_fields_are_rejected() {
        let raw = json!({ "title": "Hi", "content": body("x"), "author": "someone" });
        assert!(serde_json::from_value::<DraftInput>(raw).is_err());

        let raw = json!({ "title": "Hi", "content": body("x") });
        let draft: DraftInput = serde_json::from_value(raw).unwrap();
        assert_eq!(draft.locale, "en");
        assert!(draft.published);
    }
}
