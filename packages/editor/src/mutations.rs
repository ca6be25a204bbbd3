//! # Node Mutations
//!
//! Semantic operations on a located element. Each mutation is idempotent:
//! reapplying the same update produces the same tree.
//!
//! ## Semantics
//!
//! ### UpdateClassAttribute / UpdateAttribute
//! - Upsert: replace the existing attribute node if present, else append.
//! - Never produces two attributes of the same name.
//!
//! ### UpdateTextContent
//! - Replaces only the first non-whitespace direct text child; the run's
//!   original surrounding whitespace is kept and the new text is trimmed.
//! - Nested elements and later text runs are left untouched positionally.
//! - If no such child exists, the text is inserted as the first child.

use pagelift_parser::ast::{AttrValue, Attribute, Document, Node, NodeId, Span, TextNode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The class attribute name used by the generated component sources.
const CLASS_ATTRIBUTE: &str = "className";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Mutation {
    UpdateClassAttribute { value: String },
    UpdateTextContent { value: String },
    UpdateAttribute { name: String, value: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Element cannot contain text")]
    NotAContainer,
}

impl Mutation {
    /// Apply this mutation to the element with the given id.
    pub fn apply(&self, doc: &mut Document, node_id: NodeId) -> Result<(), MutationError> {
        let element = doc
            .find_element_mut(node_id)
            .ok_or(MutationError::NodeNotFound(node_id))?;

        match self {
            Mutation::UpdateClassAttribute { value } => {
                upsert_attribute(element, CLASS_ATTRIBUTE, value);
                Ok(())
            }

            Mutation::UpdateAttribute { name, value } => {
                upsert_attribute(element, name, value);
                Ok(())
            }

            Mutation::UpdateTextContent { value } => {
                if element.self_closing {
                    return Err(MutationError::NotAContainer);
                }
                update_text_content(element, value);
                Ok(())
            }
        }
    }
}

fn upsert_attribute(element: &mut pagelift_parser::ast::Element, name: &str, value: &str) {
    if let Some(attr) = element.attribute_mut(name) {
        attr.value = Some(AttrValue::String {
            value: value.to_string(),
        });
        attr.dirty = true;
    } else {
        element.attributes.push(Attribute {
            name: name.to_string(),
            value: Some(AttrValue::String {
                value: value.to_string(),
            }),
            span: None,
            dirty: true,
        });
    }
    element.attrs_dirty = true;
}

fn update_text_content(element: &mut pagelift_parser::ast::Element, value: &str) {
    let value = value.trim();

    let first_text = element.children.iter_mut().find_map(|child| match child {
        Node::Text(t) if !t.value.trim().is_empty() => Some(t),
        _ => None,
    });

    match first_text {
        Some(text) => {
            // Keep the run's original padding so indentation survives.
            let leading_len = text.value.len() - text.value.trim_start().len();
            let trailing_start = text.value.trim_end().len();
            text.value = format!(
                "{}{}{}",
                &text.value[..leading_len],
                value,
                &text.value[trailing_start..]
            );
            text.dirty = true;
        }
        None => {
            let at = element.open_span.end;
            element.children.insert(
                0,
                Node::Text(TextNode {
                    value: value.to_string(),
                    span: Span::empty(at),
                    dirty: true,
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelift_parser::{generate, parse};

    fn first_element_id(doc: &Document) -> NodeId {
        doc.elements()[0].id
    }

    #[test]
    fn test_class_update_is_idempotent() {
        let source = r#"<h1 className="text-lg">Hi</h1>"#;
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        let mutation = Mutation::UpdateClassAttribute {
            value: "a b".to_string(),
        };
        mutation.apply(&mut doc, id).unwrap();
        let once = doc.clone();
        mutation.apply(&mut doc, id).unwrap();

        assert_eq!(doc, once);
        let el = doc.find_element(id).unwrap();
        let class_attrs: Vec<_> = el
            .attributes
            .iter()
            .filter(|a| a.name == "className")
            .collect();
        assert_eq!(class_attrs.len(), 1);
        assert_eq!(generate(&doc, source), r#"<h1 className="a b">Hi</h1>"#);
    }

    #[test]
    fn test_class_appended_when_missing() {
        let source = "<h1>Hi</h1>";
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        Mutation::UpdateClassAttribute {
            value: "hero".to_string(),
        }
        .apply(&mut doc, id)
        .unwrap();

        assert_eq!(generate(&doc, source), r#"<h1 className="hero">Hi</h1>"#);
    }

    #[test]
    fn test_text_replacement_isolation() {
        let source = "<h1>Old<span>Keep</span>More</h1>";
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        Mutation::UpdateTextContent {
            value: "New".to_string(),
        }
        .apply(&mut doc, id)
        .unwrap();

        assert_eq!(generate(&doc, source), "<h1>New<span>Keep</span>More</h1>");
    }

    #[test]
    fn test_text_preserves_indentation() {
        let source = "<h1>\n  Old headline\n</h1>";
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        Mutation::UpdateTextContent {
            value: "New".to_string(),
        }
        .apply(&mut doc, id)
        .unwrap();

        assert_eq!(generate(&doc, source), "<h1>\n  New\n</h1>");
    }

    #[test]
    fn test_text_inserted_when_no_text_child() {
        let source = "<h1><span>x</span></h1>";
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        Mutation::UpdateTextContent {
            value: "Lead".to_string(),
        }
        .apply(&mut doc, id)
        .unwrap();

        assert_eq!(generate(&doc, source), "<h1>Lead<span>x</span></h1>");
    }

    #[test]
    fn test_text_update_is_idempotent() {
        let source = "<h1>\n  Old\n</h1>";
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        let mutation = Mutation::UpdateTextContent {
            value: "New".to_string(),
        };
        mutation.apply(&mut doc, id).unwrap();
        let once = doc.clone();
        mutation.apply(&mut doc, id).unwrap();

        assert_eq!(doc, once);
    }

    #[test]
    fn test_generic_attribute_upsert() {
        let source = r#"<a href="/old">go</a>"#;
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        Mutation::UpdateAttribute {
            name: "href".to_string(),
            value: "/new".to_string(),
        }
        .apply(&mut doc, id)
        .unwrap();

        assert_eq!(generate(&doc, source), r#"<a href="/new">go</a>"#);
    }

    #[test]
    fn test_text_update_on_self_closing_fails() {
        let source = r#"<img src="a.png" />"#;
        let mut doc = parse(source).unwrap();
        let id = first_element_id(&doc);

        let err = Mutation::UpdateTextContent {
            value: "x".to_string(),
        }
        .apply(&mut doc, id)
        .unwrap_err();

        assert_eq!(err, MutationError::NotAContainer);
    }

    #[test]
    fn test_unknown_node_id_fails() {
        let mut doc = parse("<div>x</div>").unwrap();
        let err = Mutation::UpdateClassAttribute {
            value: "x".to_string(),
        }
        .apply(&mut doc, 99)
        .unwrap_err();

        assert_eq!(err, MutationError::NodeNotFound(99));
    }
}
