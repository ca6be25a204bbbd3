use pagelift_common::ElementIdentity;
use pagelift_protocol::ThemeVariables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute injected at build time that carries an element's identity.
/// The overlay only echoes its value back to the host, never interprets it.
pub const SOURCE_ATTR: &str = "data-pl-id";

/// Index route from a document root to a node.
pub type NodePath = Vec<usize>;

/// Stand-in for a rendered element inside the preview sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Sampled resolved style properties.
    pub styles: BTreeMap<String, String>,
    /// Direct text content, if any.
    pub text: Option<String>,
    pub children: Vec<PreviewElement>,
}

impl PreviewElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: PreviewElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn identity(&self) -> Option<ElementIdentity> {
        self.attributes
            .get(SOURCE_ATTR)
            .map(|v| ElementIdentity::from(v.as_str()))
    }
}

/// The preview's rendered tree plus pushed theme state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewDocument {
    pub roots: Vec<PreviewElement>,
    pub theme: ThemeVariables,
}

impl PreviewDocument {
    pub fn new(roots: Vec<PreviewElement>) -> Self {
        Self {
            roots,
            theme: ThemeVariables::default(),
        }
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&PreviewElement> {
        let (&first, rest) = path.split_first()?;
        let mut current = self.roots.get(first)?;
        for &index in rest {
            current = current.children.get(index)?;
        }
        Some(current)
    }

    /// Nearest identity at or above `path`: the rendered node a pointer hit
    /// may be an un-instrumented descendant of the authored element.
    pub fn resolve_identity(&self, path: &[usize]) -> Option<ElementIdentity> {
        let mut prefix = path.to_vec();
        while !prefix.is_empty() {
            if let Some(id) = self.element_at(&prefix).and_then(|e| e.identity()) {
                return Some(id);
            }
            prefix.pop();
        }
        None
    }

    pub fn find_by_identity_mut(&mut self, id: &ElementIdentity) -> Option<&mut PreviewElement> {
        fn walk<'a>(
            node: &'a mut PreviewElement,
            target: &str,
        ) -> Option<&'a mut PreviewElement> {
            if node.attributes.get(SOURCE_ATTR).map(String::as_str) == Some(target) {
                return Some(node);
            }
            for child in &mut node.children {
                if let Some(found) = walk(child, target) {
                    return Some(found);
                }
            }
            None
        }

        for root in &mut self.roots {
            if let Some(found) = walk(root, id.as_str()) {
                return Some(found);
            }
        }
        None
    }

    /// Every identity-bearing element, in document order.
    pub fn instrumented_elements(&self) -> Vec<&PreviewElement> {
        fn walk<'a>(node: &'a PreviewElement, out: &mut Vec<&'a PreviewElement>) {
            if node.attributes.contains_key(SOURCE_ATTR) {
                out.push(node);
            }
            for child in &node.children {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, &mut out);
        }
        out
    }
}
