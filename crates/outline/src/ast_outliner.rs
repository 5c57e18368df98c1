use crate::config::TestMarkers;
use crate::error::ParseFailure;
use crate::language::Language;
use crate::node::{Node, NodeKind};
use crate::span::{LineIndex, Span};
use tree_sitter::{Node as SyntaxNode, Parser};

/// Tree-sitter based outliner for Python and JavaScript/TypeScript
pub struct AstOutliner<'a> {
    parser: Parser,
    language: Language,
    markers: &'a TestMarkers,
}

impl<'a> AstOutliner<'a> {
    /// Create new outliner for a language
    pub fn new(language: Language, markers: &'a TestMarkers) -> Result<Self, ParseFailure> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ParseFailure::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self {
            parser,
            language,
            markers,
        })
    }

    /// Parse `content` into a root node with its declarations.
    ///
    /// Any error or missing node in the syntax tree fails the whole parse;
    /// partial trees are never returned.
    pub fn outline(&mut self, content: &str) -> Result<Node, ParseFailure> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ParseFailure::tree_sitter("Failed to parse source code"))?;

        let root = tree.root_node();
        if root.has_error() {
            let at = Self::first_error(root).unwrap_or(root).start_position();
            return Err(ParseFailure::Syntax {
                line: at.row + 1,
                column: at.column + 1,
            });
        }

        if self.language == Language::Python {
            if let Some(statement) = Self::first_legacy_statement(root) {
                let at = statement.start_position();
                return Err(ParseFailure::Syntax {
                    line: at.row + 1,
                    column: at.column + 1,
                });
            }
        }

        let mut outline = Node::root(content.len());
        match self.language {
            Language::Python => self.extract_python(content, root, &mut outline),
            Language::JavaScript | Language::TypeScript | Language::Tsx => {
                Self::extract_js(content, root, &mut outline);
            }
            _ => {}
        }

        Ok(outline)
    }

    /// Walk the top-level statements of a Python module
    fn extract_python(&self, content: &str, module: SyntaxNode, outline: &mut Node) {
        let lines = LineIndex::new(content);
        let prefix = self.markers.function_prefix.as_str();

        let mut cursor = module.walk();
        for statement in module.children(&mut cursor) {
            let Some(definition) = Self::unwrap_decorated(statement) else {
                continue;
            };
            let Some(name) = Self::field_text(content, definition, "name") else {
                continue;
            };

            match definition.kind() {
                "function_definition" => {
                    let span = Self::point_span(&lines, definition);
                    let is_test = name.starts_with(prefix);
                    outline.insert(Node::new(name, span, NodeKind::Function).tested(is_test));
                }
                "class_definition" => {
                    let class = self.python_class(content, &lines, definition, name);
                    outline.insert(class);
                }
                _ => {}
            }
        }
    }

    /// Build a class node with its directly nested methods
    fn python_class(
        &self,
        content: &str,
        lines: &LineIndex,
        class_node: SyntaxNode,
        name: String,
    ) -> Node {
        let is_test_class = name.starts_with(self.markers.class_prefix.as_str())
            || Self::python_bases(content, class_node)
                .iter()
                .any(|base| base == &self.markers.base_name);

        let mut class = Node::new(name, Self::point_span(lines, class_node), NodeKind::Class);

        let Some(body) = class_node.child_by_field_name("body") else {
            return class;
        };

        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            let Some(method) = Self::unwrap_decorated(member) else {
                continue;
            };
            if method.kind() != "function_definition" {
                continue;
            }
            let Some(method_name) = Self::field_text(content, method, "name") else {
                continue;
            };

            let is_test =
                is_test_class && method_name.starts_with(self.markers.function_prefix.as_str());
            let span = Self::point_span(lines, method);
            class.insert(Node::new(method_name, span, NodeKind::Method).tested(is_test));
        }

        class
    }

    /// Base class identifiers; dotted bases contribute their final attribute
    fn python_bases(content: &str, class_node: SyntaxNode) -> Vec<String> {
        let Some(arguments) = class_node.child_by_field_name("superclasses") else {
            return Vec::new();
        };

        let mut bases = Vec::new();
        let mut cursor = arguments.walk();
        for argument in arguments.named_children(&mut cursor) {
            let identifier = match argument.kind() {
                "identifier" => Some(argument),
                // unittest.TestCase
                "attribute" => argument.child_by_field_name("attribute"),
                _ => None,
            };
            if let Some(text) = identifier.and_then(|n| n.utf8_text(content.as_bytes()).ok()) {
                bases.push(text.to_string());
            }
        }
        bases
    }

    /// Depth-first walk collecting named functions and classes at any depth
    fn extract_js(content: &str, program: SyntaxNode, outline: &mut Node) {
        let mut stack = vec![program];

        while let Some(node) = stack.pop() {
            match node.kind() {
                "function_declaration" => {
                    if let Some(name) = Self::field_text(content, node, "name") {
                        outline.insert(Node::new(name, Self::byte_span(node), NodeKind::Function));
                    }
                }
                "class_declaration" => {
                    if let Some(name) = Self::field_text(content, node, "name") {
                        outline.insert(Self::js_class(content, node, name));
                    }
                }
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Build a class node whose children are the named methods of its body
    fn js_class(content: &str, class_node: SyntaxNode, name: String) -> Node {
        let mut class = Node::new(name, Self::byte_span(class_node), NodeKind::Class);

        let Some(body) = class_node.child_by_field_name("body") else {
            return class;
        };

        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() != "method_definition" {
                continue;
            }
            if let Some(method_name) = Self::field_text(content, member, "name") {
                class.insert(Node::new(
                    method_name,
                    Self::byte_span(member),
                    NodeKind::Method,
                ));
            }
        }

        class
    }

    /// `@decorator` wrappers report the wrapped definition
    fn unwrap_decorated(node: SyntaxNode) -> Option<SyntaxNode> {
        if node.kind() == "decorated_definition" {
            node.child_by_field_name("definition")
        } else {
            Some(node)
        }
    }

    fn field_text(content: &str, node: SyntaxNode, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .and_then(|child| child.utf8_text(content.as_bytes()).ok())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Span from row/column points through the line-start table
    fn point_span(lines: &LineIndex, node: SyntaxNode) -> Span {
        let start = node.start_position();
        let end = node.end_position();
        Span::new(
            lines.offset(start.row, start.column),
            lines.offset(end.row, end.column),
        )
    }

    fn byte_span(node: SyntaxNode) -> Span {
        Span::new(node.start_byte(), node.end_byte())
    }

    /// Python 2 `print`/`exec` statements, which the grammar accepts but
    /// Python 3 rejects
    fn first_legacy_statement(root: SyntaxNode) -> Option<SyntaxNode> {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if matches!(node.kind(), "print_statement" | "exec_statement") {
                return Some(node);
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Locate the first error or missing node, depth-first
    fn first_error(node: SyntaxNode) -> Option<SyntaxNode> {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        children
            .into_iter()
            .filter(|child| child.has_error())
            .find_map(Self::first_error)
    }
}
