//! dog-content: the structured document model behind DogRS publishing.
//!
//! A [`Document`] is a tree of [`Node`]s rooted at a single `doc` node. Node
//! kinds form a closed set ([`NodeKind`]); anything outside it is rejected at
//! parse time instead of being carried along silently. Adding a kind is a
//! schema change in this crate.
//!
//! ```rust
//! use dog_content::{parse, serialize};
//!
//! let raw = r#"{"content":[{"content":[{"text":"hi","type":"text"}],"type":"paragraph"}],"type":"doc"}"#;
//! let doc = parse(raw).unwrap();
//! assert_eq!(serialize(&doc), raw);
//! ```

mod canonical;
mod document;
mod error;
mod node;
mod parse;

pub use canonical::{serialize, to_value};
pub use document::Document;
pub use error::{ValidationError, ValidationReason};
pub use node::{is_placeholder, Attrs, Mark, MarkKind, Node, NodeKind, PLACEHOLDER_SCHEME};
pub use parse::parse;

/// Attribute names with meaning to the publishing pipeline.
pub mod attrs {
    pub const SRC: &str = "src";
    pub const ALT: &str = "alt";
    pub const TITLE: &str = "title";
    pub const LEVEL: &str = "level";
    pub const START: &str = "start";
    pub const HREF: &str = "href";
    /// Internal link from an unresolved image to its registry entry.
    pub const MEDIA_KEY: &str = "media_key";
}
