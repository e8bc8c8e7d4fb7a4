use std::collections::BTreeMap;

use serde_json::Value;

use crate::attrs;

/// Scheme prefix of registry-issued placeholder tokens (`tmp:<id>`).
pub const PLACEHOLDER_SCHEME: &str = "tmp:";

/// Node attributes. A `BTreeMap` so iteration (and output) is key-ordered.
pub type Attrs = BTreeMap<String, Value>;

/// True when `src` is a staged-media placeholder rather than a durable URL.
pub fn is_placeholder(src: &str) -> bool {
    src.len() > PLACEHOLDER_SCHEME.len() && src.starts_with(PLACEHOLDER_SCHEME)
}

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    CodeBlock,
    HorizontalRule,
    HardBreak,
    Image,
    Text,
}

impl NodeKind {
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Doc,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::Blockquote,
        NodeKind::BulletList,
        NodeKind::OrderedList,
        NodeKind::ListItem,
        NodeKind::CodeBlock,
        NodeKind::HorizontalRule,
        NodeKind::HardBreak,
        NodeKind::Image,
        NodeKind::Text,
    ];

    /// Wire name (`type` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Blockquote => "blockquote",
            NodeKind::BulletList => "bullet_list",
            NodeKind::OrderedList => "ordered_list",
            NodeKind::ListItem => "list_item",
            NodeKind::CodeBlock => "code_block",
            NodeKind::HorizontalRule => "horizontal_rule",
            NodeKind::HardBreak => "hard_break",
            NodeKind::Image => "image",
            NodeKind::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Kinds that may sit directly under `doc`, `blockquote` or `list_item`.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading
                | NodeKind::Blockquote
                | NodeKind::BulletList
                | NodeKind::OrderedList
                | NodeKind::CodeBlock
                | NodeKind::HorizontalRule
                | NodeKind::Image
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::HardBreak)
    }

    /// Kinds that never carry content.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::Image | NodeKind::HorizontalRule | NodeKind::HardBreak
        )
    }
}

/// Inline formatting on text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Strike,
    Code,
    Link,
}

impl MarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
            MarkKind::Strike => "strike",
            MarkKind::Code => "code",
            MarkKind::Link => "link",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bold" => Some(MarkKind::Bold),
            "italic" => Some(MarkKind::Italic),
            "strike" => Some(MarkKind::Strike),
            "code" => Some(MarkKind::Code),
            "link" => Some(MarkKind::Link),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub kind: MarkKind,
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
        }
    }

    pub fn link<S: Into<String>>(href: S) -> Self {
        let mut mark = Self::new(MarkKind::Link);
        mark.attrs
            .insert(attrs::HREF.to_string(), Value::String(href.into()));
        mark
    }
}

/// One node of the tree. Empty `attrs`, `content` and `marks` are the same as
/// absent ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub attrs: Attrs,
    pub content: Vec<Node>,
    pub marks: Vec<Mark>,
    pub text: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            content: Vec::new(),
            marks: Vec::new(),
            text: None,
        }
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text)
        }
    }

    pub fn paragraph<S: Into<String>>(text: S) -> Self {
        Self::new(NodeKind::Paragraph).with_child(Self::text(text))
    }

    pub fn image<S: Into<String>>(src: S) -> Self {
        Self::new(NodeKind::Image).with_attr(attrs::SRC, Value::String(src.into()))
    }

    pub fn with_attr<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.content.push(child);
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// `src` of an image node.
    pub fn src(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Image => self.attr_str(attrs::SRC),
            _ => None,
        }
    }
}
