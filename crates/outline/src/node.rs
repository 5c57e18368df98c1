use crate::span::Span;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of every root node
pub const ROOT_NAME: &str = ".";

/// An addressable named region of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Lookup key, unique among siblings
    pub name: String,

    /// Byte range of the region
    pub span: Span,

    /// What kind of construct the region covers
    pub kind: NodeKind,

    /// Tagged as a test case (Python functions and methods only)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_test: bool,

    /// Named children, in first-insertion order
    #[serde(default)]
    pub children: IndexMap<String, Node>,
}

impl Node {
    /// Create a childless node
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            span,
            kind,
            is_test: false,
            children: IndexMap::new(),
        }
    }

    /// Root node covering a whole text of `len` bytes
    #[must_use]
    pub fn root(len: usize) -> Self {
        Self::new(ROOT_NAME, Span::new(0, len), NodeKind::File)
    }

    /// Builder: set the test tag
    #[must_use]
    pub const fn tested(mut self, is_test: bool) -> Self {
        self.is_test = is_test;
        self
    }

    /// Insert a child keyed by its name; a colliding name replaces the earlier child
    pub fn insert(&mut self, child: Node) {
        if let Some(previous) = self.children.insert(child.name.clone(), child) {
            log::debug!("Duplicate name '{}' in '{}', last one wins", previous.name, self.name);
        }
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order traversal yielding `(depth, node)`, the root at depth 0
    pub fn walk(&self) -> impl Iterator<Item = (usize, &Node)> {
        let mut stack = vec![(0usize, self)];
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.values().rev().map(|child| (depth + 1, child)));
            Some((depth, node))
        })
    }

    /// All nodes tagged as tests
    pub fn tests(&self) -> impl Iterator<Item = &Node> {
        self.walk().map(|(_, node)| node).filter(|node| node.is_test)
    }

    /// Check that every child span is nested inside its parent span
    #[must_use]
    pub fn is_well_nested(&self) -> bool {
        self.children
            .values()
            .all(|child| self.span.contains(child.span) && child.is_well_nested())
    }
}

/// Kind of region a node covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Whole file (root)
    File,
    /// Class declaration
    Class,
    /// Standalone function
    Function,
    /// Function inside a class body
    Method,
    /// Markup element addressed by its id
    Element,
    /// Stylesheet rule addressed by its selector
    Rule,
}

impl NodeKind {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Element => "element",
            Self::Rule => "rule",
        }
    }
}
