//! # Code Generator
//!
//! Serializes a mutated tree back into source text by splicing: any node
//! untouched by a mutation is copied verbatim from the original source
//! (comments, whitespace, and raw non-markup segments included), and only
//! dirty nodes are re-emitted. A dirty attribute list re-emits just the
//! open tag; a dirty text child re-emits just that child.
//!
//! Original line numbering is deliberately not preserved when node shapes
//! change; identities for other nodes in the same file may shift after a
//! commit, which the locator's fuzzy fallback absorbs.

use crate::ast::{AttrValue, Attribute, Document, Element, Node};

/// Regenerate source text from a (possibly mutated) document.
///
/// `source` must be the exact text the document was parsed from.
pub fn generate(doc: &Document, source: &str) -> String {
    let mut output = String::new();
    for node in &doc.nodes {
        emit_node(node, source, &mut output);
    }
    output
}

fn is_dirty(node: &Node) -> bool {
    match node {
        Node::Text(t) => t.dirty,
        Node::Element(e) => e.attrs_dirty || e.children.iter().any(is_dirty),
        Node::Comment(_) | Node::Expression(_) => false,
    }
}

fn emit_node(node: &Node, source: &str, output: &mut String) {
    if !is_dirty(node) {
        let span = node.span();
        output.push_str(&source[span.start..span.end]);
        return;
    }

    match node {
        Node::Text(t) => output.push_str(&t.value),
        Node::Element(e) => emit_element(e, source, output),
        // Comments and expressions are never dirty
        Node::Comment(c) => output.push_str(&source[c.span.start..c.span.end]),
        Node::Expression(x) => output.push_str(&source[x.span.start..x.span.end]),
    }
}

fn emit_element(element: &Element, source: &str, output: &mut String) {
    if element.attrs_dirty {
        emit_open_tag(element, source, output);
    } else {
        let open = element.open_span;
        output.push_str(&source[open.start..open.end]);
    }

    if element.self_closing {
        return;
    }

    for child in &element.children {
        emit_node(child, source, output);
    }

    // Closing tag region: from the end of the last original child (or the
    // open tag, if none) through the element's end.
    let close_start = element
        .children
        .iter()
        .map(|c| c.span().end)
        .max()
        .unwrap_or(element.open_span.end)
        .max(element.open_span.end);

    if element.span.end > close_start {
        output.push_str(&source[close_start..element.span.end]);
    }
}

fn emit_open_tag(element: &Element, source: &str, output: &mut String) {
    output.push('<');
    output.push_str(&element.tag_name);

    for attr in &element.attributes {
        output.push(' ');
        match attr.span {
            Some(span) if !attr.dirty => output.push_str(&source[span.start..span.end]),
            _ => emit_attribute(attr, output),
        }
    }

    output.push_str(if element.self_closing { " />" } else { ">" });
}

fn emit_attribute(attr: &Attribute, output: &mut String) {
    output.push_str(&attr.name);

    match &attr.value {
        Some(AttrValue::String { value }) => {
            output.push_str("=\"");
            output.push_str(&value.replace('"', "&quot;"));
            output.push('"');
        }
        Some(AttrValue::Expression { raw }) => {
            output.push('=');
            output.push_str(raw);
        }
        Some(AttrValue::Bare { value }) => {
            output.push('=');
            output.push_str(value);
        }
        None => {}
    }
}
