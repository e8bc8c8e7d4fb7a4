use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{attrs, canonical, is_placeholder, parse, Node, NodeKind, ValidationError};

/// A validated tree rooted at a `doc` node.
///
/// The only ways to obtain one are [`crate::parse`], [`Document::from_value`]
/// and [`Document::from_node`], so every `Document` has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
}

impl Document {
    pub fn empty() -> Self {
        Self {
            root: Node::new(NodeKind::Doc),
        }
    }

    pub(crate) fn from_validated_root(root: Node) -> Self {
        Self { root }
    }

    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        parse::parse_value(value)
    }

    /// Validate a tree built in code.
    pub fn from_node(root: Node) -> Result<Self, ValidationError> {
        Self::from_value(&canonical::node_to_value(&root))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn blocks(&self) -> &[Node] {
        &self.root.content
    }

    /// Image nodes in document order (pre-order, left to right).
    pub fn images(&self) -> Vec<&Node> {
        fn collect<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
            if node.kind == NodeKind::Image {
                out.push(node);
            }
            for child in &node.content {
                collect(child, out);
            }
        }

        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    /// Placeholder `src` values in document order.
    pub fn placeholders(&self) -> Vec<&str> {
        self.images()
            .into_iter()
            .filter_map(Node::src)
            .filter(|src| is_placeholder(src))
            .collect()
    }

    pub fn has_placeholders(&self) -> bool {
        !self.placeholders().is_empty()
    }

    /// Text content, one line per top-level block.
    pub fn plain_text(&self) -> String {
        fn gather(node: &Node, out: &mut String) {
            match node.kind {
                NodeKind::Text => out.push_str(node.text.as_deref().unwrap_or_default()),
                NodeKind::HardBreak => out.push(' '),
                _ => node.content.iter().for_each(|c| gather(c, out)),
            }
        }

        self.blocks()
            .iter()
            .map(|block| {
                let mut line = String::new();
                gather(block, &mut line);
                line
            })
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Visit every image `src` in document order. When `rewrite` returns a new
    /// source the node's `src` is replaced and its `media_key` link dropped.
    /// Returns the number of rewritten nodes.
    pub fn rewrite_image_sources<F>(&mut self, mut rewrite: F) -> usize
    where
        F: FnMut(&str) -> Option<String>,
    {
        fn walk<F: FnMut(&str) -> Option<String>>(node: &mut Node, rewrite: &mut F) -> usize {
            let mut count = 0;
            if node.kind == NodeKind::Image {
                let replacement = node.attr_str(attrs::SRC).and_then(|src| rewrite(src));
                if let Some(src) = replacement {
                    node.attrs.insert(attrs::SRC.to_string(), Value::String(src));
                    node.attrs.remove(attrs::MEDIA_KEY);
                    count += 1;
                }
            }
            for child in &mut node.content {
                count += walk(child, rewrite);
            }
            count
        }

        walk(&mut self.root, &mut rewrite)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        canonical::to_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Document::from_value(&value).map_err(serde::de::Error::custom)
    }
}
