//! Canonical serialization.
//!
//! Compact JSON, object keys in lexicographic order at every level, empty
//! `attrs` / `content` / `marks` omitted, `null` attribute values dropped by
//! the parser. Keys are inserted already sorted, so the output is the same
//! whether or not `serde_json` preserves insertion order.

use serde_json::{Map, Value};

use crate::{Document, Mark, Node};

/// Canonical text form of a document.
pub fn serialize(doc: &Document) -> String {
    to_value(doc).to_string()
}

/// Canonical JSON value of a document.
pub fn to_value(doc: &Document) -> Value {
    node_to_value(doc.root())
}

pub(crate) fn node_to_value(node: &Node) -> Value {
    let mut obj = Map::new();

    if !node.attrs.is_empty() {
        obj.insert("attrs".to_string(), attrs_to_value(&node.attrs));
    }
    if !node.content.is_empty() {
        obj.insert(
            "content".to_string(),
            Value::Array(node.content.iter().map(node_to_value).collect()),
        );
    }
    if !node.marks.is_empty() {
        obj.insert(
            "marks".to_string(),
            Value::Array(node.marks.iter().map(mark_to_value).collect()),
        );
    }
    if let Some(text) = &node.text {
        obj.insert("text".to_string(), Value::String(text.clone()));
    }
    obj.insert("type".to_string(), Value::String(node.kind.as_str().to_string()));

    Value::Object(obj)
}

fn mark_to_value(mark: &Mark) -> Value {
    let mut obj = Map::new();
    if !mark.attrs.is_empty() {
        obj.insert("attrs".to_string(), attrs_to_value(&mark.attrs));
    }
    obj.insert("type".to_string(), Value::String(mark.kind.as_str().to_string()));
    Value::Object(obj)
}

fn attrs_to_value(attrs: &crate::Attrs) -> Value {
    Value::Object(
        attrs
            .iter()
            .map(|(k, v)| (k.clone(), sort_keys(v)))
            .collect(),
    )
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, MarkKind, NodeKind};

    #[test]
    fn output_is_independent_of_input_key_order() {
        let a = parse(
            r#"{"type":"doc","content":[{"type":"heading","attrs":{"level":2,"id":"x"},"content":[{"type":"text","text":"T"}]}]}"#,
        )
        .unwrap();
        let b = parse(
            r#"{ "content": [ { "content": [ { "text": "T", "type": "text" } ], "attrs": { "id": "x", "level": 2 }, "type": "heading" } ], "type": "doc" }"#,
        )
        .unwrap();

        assert_eq!(serialize(&a), serialize(&b));
        assert_eq!(
            serialize(&a),
            r#"{"content":[{"attrs":{"id":"x","level":2},"content":[{"text":"T","type":"text"}],"type":"heading"}],"type":"doc"}"#
        );
    }

    #[test]
    fn marks_serialize_after_content_and_before_text() {
        let root = Node::new(NodeKind::Doc).with_child(
            Node::new(NodeKind::Paragraph).with_child(
                Node::text("docs")
                    .with_mark(Mark::new(MarkKind::Bold))
                    .with_mark(Mark::link("https://dogrs.dev")),
            ),
        );
        let doc = Document::from_node(root).unwrap();

        assert_eq!(
            serialize(&doc),
            r#"{"content":[{"content":[{"marks":[{"type":"bold"},{"attrs":{"href":"https://dogrs.dev"},"type":"link"}],"text":"docs","type":"text"}],"type":"paragraph"}],"type":"doc"}"#
        );
    }
}
