use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::{
    attrs, is_placeholder, Attrs, Document, Mark, MarkKind, Node, NodeKind, ValidationError,
};

const NODE_KEYS: [&str; 5] = ["type", "attrs", "content", "marks", "text"];

/// Parse and validate raw JSON into a [`Document`].
pub fn parse(raw: &str) -> Result<Document, ValidationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ValidationError::malformed("$", format!("invalid JSON: {e}")))?;
    parse_value(&value)
}

pub(crate) fn parse_value(value: &Value) -> Result<Document, ValidationError> {
    let mut parser = TreeParser::default();
    let root = parser.node(value, "$")?;
    if root.kind != NodeKind::Doc {
        return Err(ValidationError::malformed(
            "$",
            format!("root must be `doc`, found `{}`", root.kind.as_str()),
        ));
    }
    parser.children_allowed(&root, "$")?;
    Ok(Document::from_validated_root(root))
}

#[derive(Default)]
struct TreeParser {
    placeholders: HashSet<String>,
}

impl TreeParser {
    fn node(&mut self, value: &Value, path: &str) -> Result<Node, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed(path, "node must be an object"))?;

        if let Some(key) = obj.keys().find(|k| !NODE_KEYS.contains(&k.as_str())) {
            return Err(ValidationError::malformed(path, format!("unexpected field `{key}`")));
        }

        let name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::malformed(path, "node `type` must be a string"))?;
        let kind = NodeKind::from_name(name)
            .ok_or_else(|| ValidationError::unknown_node_type(path, name))?;

        let mut node = Node::new(kind);
        node.attrs = attrs_of(obj.get("attrs"), path)?;

        match obj.get("text") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) if kind == NodeKind::Text => node.text = Some(text.clone()),
            Some(Value::String(_)) => {
                return Err(ValidationError::malformed(
                    path,
                    format!("`{}` nodes cannot carry text", kind.as_str()),
                ))
            }
            Some(_) => return Err(ValidationError::malformed(path, "`text` must be a string")),
        }

        match obj.get("marks") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) if items.is_empty() => {}
            Some(Value::Array(items)) if kind == NodeKind::Text => {
                node.marks = items
                    .iter()
                    .enumerate()
                    .map(|(i, m)| mark(m, &format!("{path}.marks[{i}]")))
                    .collect::<Result<_, _>>()?;
            }
            Some(Value::Array(_)) => {
                return Err(ValidationError::malformed(path, "only text nodes carry marks"))
            }
            Some(_) => return Err(ValidationError::malformed(path, "`marks` must be an array")),
        }

        match obj.get("content") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (i, child) in items.iter().enumerate() {
                    let child_path = format!("{path}.content[{i}]");
                    let child = self.node(child, &child_path)?;
                    self.children_allowed(&child, &child_path)?;
                    node.content.push(child);
                }
            }
            Some(_) => return Err(ValidationError::malformed(path, "`content` must be an array")),
        }

        self.node_rules(&node, path)?;
        Ok(node)
    }

    /// Rules about a node's own fields.
    fn node_rules(&mut self, node: &Node, path: &str) -> Result<(), ValidationError> {
        if node.kind.is_leaf() && !node.content.is_empty() {
            return Err(ValidationError::malformed(
                path,
                format!("`{}` nodes cannot have content", node.kind.as_str()),
            ));
        }

        match node.kind {
            NodeKind::Text => {
                if node.text.as_deref().map_or(true, str::is_empty) {
                    return Err(ValidationError::malformed(path, "text nodes need non-empty text"));
                }
            }
            NodeKind::Heading => {
                if let Some(level) = node.attrs.get(attrs::LEVEL) {
                    match level.as_u64() {
                        Some(1..=6) => {}
                        _ => {
                            return Err(ValidationError::malformed(
                                path,
                                "heading level must be an integer from 1 to 6",
                            ))
                        }
                    }
                }
            }
            NodeKind::OrderedList => {
                if let Some(start) = node.attrs.get(attrs::START) {
                    if start.as_u64().is_none() {
                        return Err(ValidationError::malformed(
                            path,
                            "ordered list start must be a non-negative integer",
                        ));
                    }
                }
            }
            NodeKind::Image => self.image_rules(node, path)?,
            _ => {}
        }
        Ok(())
    }

    fn image_rules(&mut self, node: &Node, path: &str) -> Result<(), ValidationError> {
        let src = node
            .attr_str(attrs::SRC)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ValidationError::malformed(path, "image needs a non-empty `src`"))?;

        for key in [attrs::ALT, attrs::TITLE, attrs::MEDIA_KEY] {
            if node.attrs.get(key).is_some_and(|v| !v.is_string()) {
                return Err(ValidationError::malformed(path, format!("image `{key}` must be a string")));
            }
        }

        if let Some(link) = node.attr_str(attrs::MEDIA_KEY) {
            if is_placeholder(src) && link != src {
                return Err(ValidationError::malformed(
                    path,
                    format!("image `media_key` {link} does not match src {src}"),
                ));
            }
        }

        if is_placeholder(src) && !self.placeholders.insert(src.to_string()) {
            return Err(ValidationError::malformed(
                path,
                format!("staged media {src} is referenced by more than one image"),
            ));
        }
        Ok(())
    }

    /// Rules about which kinds may appear under `node`.
    fn children_allowed(&self, node: &Node, path: &str) -> Result<(), ValidationError> {
        let kind = node.kind;
        let allowed: fn(NodeKind) -> bool = match kind {
            NodeKind::Doc | NodeKind::Blockquote | NodeKind::ListItem => |k| k.is_block(),
            NodeKind::BulletList | NodeKind::OrderedList => |k| k == NodeKind::ListItem,
            NodeKind::Paragraph | NodeKind::Heading => |k| k.is_inline(),
            NodeKind::CodeBlock => |k| k == NodeKind::Text,
            _ => |_| false,
        };

        for (i, child) in node.content.iter().enumerate() {
            if !allowed(child.kind) {
                return Err(ValidationError::malformed(
                    format!("{path}.content[{i}]"),
                    format!("`{}` is not allowed inside `{}`", child.kind.as_str(), kind.as_str()),
                ));
            }
            if kind == NodeKind::CodeBlock && !child.marks.is_empty() {
                return Err(ValidationError::malformed(
                    format!("{path}.content[{i}]"),
                    "code block text cannot be marked",
                ));
            }
        }

        let needs_children = matches!(
            kind,
            NodeKind::BulletList | NodeKind::OrderedList | NodeKind::ListItem | NodeKind::Blockquote
        );
        if needs_children && node.content.is_empty() {
            return Err(ValidationError::malformed(
                path,
                format!("`{}` needs at least one child", kind.as_str()),
            ));
        }
        Ok(())
    }
}

fn attrs_of(value: Option<&Value>, path: &str) -> Result<Attrs, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(Attrs::new()),
        Some(Value::Object(map)) => Ok(non_null(map)),
        Some(_) => Err(ValidationError::malformed(path, "`attrs` must be an object")),
    }
}

fn non_null(map: &Map<String, Value>) -> Attrs {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn mark(value: &Value, path: &str) -> Result<Mark, ValidationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ValidationError::malformed(path, "mark must be an object"))?;
    let name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::malformed(path, "mark `type` must be a string"))?;
    let kind = MarkKind::from_name(name)
        .ok_or_else(|| ValidationError::malformed(path, format!("unknown mark `{name}`")))?;

    let mark = Mark {
        kind,
        attrs: attrs_of(obj.get("attrs"), path)?,
    };
    if kind == MarkKind::Link && mark.attrs.get(attrs::HREF).and_then(Value::as_str).is_none() {
        return Err(ValidationError::malformed(path, "link mark needs a string `href`"));
    }
    Ok(mark)
}
