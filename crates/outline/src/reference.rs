use crate::error::{OutlineError, Result};
use crate::node::Node;
use std::fmt;
use std::str::FromStr;

/// Separator between the file path and each child name
pub const SEPARATOR: &str = "::";

/// Parsed `path(::name)*` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    file: String,
    segments: Vec<String>,
}

impl Reference {
    /// Parse a reference string.
    ///
    /// The file segment must be non-empty; name segments may be anything
    /// (an empty name simply never resolves).
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(SEPARATOR);
        let file = parts.next().unwrap_or_default().trim();
        if file.is_empty() {
            return Err(OutlineError::InvalidReference(format!(
                "'{raw}' has no file path"
            )));
        }

        Ok(Self {
            file: file.to_string(),
            segments: parts.map(str::to_string).collect(),
        })
    }

    /// Reference addressing the whole file
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file: path.into(),
            segments: Vec::new(),
        }
    }

    /// Builder: append a child name
    #[must_use]
    pub fn child(mut self, name: impl Into<String>) -> Self {
        self.segments.push(name.into());
        self
    }

    /// Leading file segment
    #[must_use]
    pub fn path(&self) -> &str {
        &self.file
    }

    /// Child-lookup names after the file segment
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the reference addresses the root node
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walk the segments from `root`, failing on the first missing one
    pub fn resolve<'a>(&self, root: &'a Node) -> Result<&'a Node> {
        let mut node = root;
        for (idx, segment) in self.segments.iter().enumerate() {
            node = node
                .child(segment)
                .ok_or_else(|| OutlineError::UnknownReference {
                    reference: self.to_string(),
                    segment: segment.clone(),
                    position: idx + 1,
                })?;
        }
        Ok(node)
    }
}

impl FromStr for Reference {
    type Err = OutlineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file)?;
        for segment in &self.segments {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::span::Span;

    fn tree() -> Node {
        let mut root = Node::root(100);
        let mut class = Node::new("A", Span::new(0, 50), NodeKind::Class);
        class.insert(Node::new("m", Span::new(10, 20), NodeKind::Method));
        root.insert(class);
        root
    }

    #[test]
    fn test_parse_and_display() {
        let reference = Reference::parse("src/a.py::A::m").unwrap();
        assert_eq!(reference.path(), "src/a.py");
        assert_eq!(reference.segments(), ["A", "m"]);
        assert_eq!(reference.to_string(), "src/a.py::A::m");

        let bare: Reference = "a.py".parse().unwrap();
        assert!(bare.is_file());
    }

    #[test]
    fn test_parse_rejects_missing_path() {
        assert!(matches!(
            Reference::parse("::A"),
            Err(OutlineError::InvalidReference(_))
        ));
        assert!(Reference::parse("").is_err());
    }

    #[test]
    fn test_resolve_walks_levels() {
        let root = tree();
        let node = Reference::file("a.py").child("A").child("m").resolve(&root).unwrap();
        assert_eq!(node.span, Span::new(10, 20));

        let whole = Reference::file("a.py").resolve(&root).unwrap();
        assert_eq!(whole.name, ".");
    }

    #[test]
    fn test_resolve_reports_first_missing_segment() {
        let root = tree();
        let err = Reference::parse("a.py::A::nope::deeper::deepest")
            .unwrap()
            .resolve(&root)
            .unwrap_err();
        match err {
            OutlineError::UnknownReference {
                segment, position, ..
            } => {
                assert_eq!(segment, "nope");
                assert_eq!(position, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
