use serde::{Deserialize, Serialize};

/// Byte span into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span, used for nodes synthesized by mutations.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

/// Stable per-document element id, assigned in parse (traversal) order.
pub type NodeId = u32;

/// A parsed markup file.
///
/// Top-level nodes are a mix of elements and raw segments (imports,
/// function wrappers, anything that is not markup). The tree is produced
/// fresh from the file's current text on every mutation cycle and is
/// discarded after code generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Element(Element),
    Text(TextNode),
    Comment(CommentNode),
    Expression(ExpressionNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: NodeId,
    pub tag_name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub self_closing: bool,

    /// Whole element, `<` through the final `>`.
    pub span: Span,
    /// Open tag only, `<` through its `>` (equals `span` when self-closing).
    pub open_span: Span,

    /// 1-indexed line of the `<`.
    pub line: u32,
    /// 0-indexed column of the `<`.
    pub column: u32,

    /// Set by mutations that touch the attribute list; tells the generator
    /// the open tag must be re-emitted.
    #[serde(skip)]
    pub attrs_dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<AttrValue>,

    /// Original source span covering `name="value"`. `None` for attributes
    /// appended by a mutation.
    pub span: Option<Span>,
    #[serde(skip)]
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttrValue {
    /// Quoted string value (stored without the quotes).
    String { value: String },
    /// Brace expression, stored verbatim including the braces.
    Expression { raw: String },
    /// Unquoted value (numbers and the like).
    Bare { value: String },
}

/// Character data, including whitespace-only runs between elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub value: String,
    pub span: Span,
    #[serde(skip)]
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    /// Full comment text including the `<!--` / `-->` delimiters.
    pub raw: String,
    pub span: Span,
}

/// Balanced `{ ... }` container, contents opaque, stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionNode {
    pub raw: String,
    pub span: Span,
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Element(e) => e.span,
            Node::Text(t) => t.span,
            Node::Comment(c) => c.span,
            Node::Expression(x) => x.span,
        }
    }
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }
}

impl Document {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// All elements in document (pre-order traversal) order.
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        for node in &self.nodes {
            collect_elements(node, &mut out);
        }
        out
    }

    pub fn find_element(&self, id: NodeId) -> Option<&Element> {
        self.elements().into_iter().find(|e| e.id == id)
    }

    pub fn find_element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        for node in &mut self.nodes {
            if let Some(found) = find_element_mut_in(node, id) {
                return Some(found);
            }
        }
        None
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_elements<'a>(node: &'a Node, out: &mut Vec<&'a Element>) {
    if let Node::Element(el) = node {
        out.push(el);
        for child in &el.children {
            collect_elements(child, out);
        }
    }
}

fn find_element_mut_in(node: &mut Node, id: NodeId) -> Option<&mut Element> {
    if let Node::Element(el) = node {
        if el.id == id {
            return Some(el);
        }
        for child in &mut el.children {
            if let Some(found) = find_element_mut_in(child, id) {
                return Some(found);
            }
        }
    }
    None
}
