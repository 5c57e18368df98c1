use crate::ast_outliner::AstOutliner;
use crate::config::{OutlineConfig, TestMarkers};
use crate::error::{OutlineError, ParseFailure, Result};
use crate::language::Language;
use crate::markup;
use crate::node::Node;
use crate::reference::Reference;
use crate::stylesheet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One open file: its text, the outline derived from it and the editor over both.
///
/// The outline is rebuilt from scratch after every mutation and is never
/// patched in place, so spans always describe the current text.
#[derive(Debug, Clone)]
pub struct Handler {
    path: PathBuf,
    text: String,
    root: Node,
    /// Family the file extension asks for
    detected: Language,
    /// Family actually used for the current outline (`Opaque` after a fallback)
    language: Language,
    parse_failure: Option<ParseFailure>,
    markers: TestMarkers,
}

impl Handler {
    /// Open a file with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &OutlineConfig::default())
    }

    /// Read and outline a file.
    ///
    /// Malformed source never fails: the handler degrades to an opaque outline.
    /// Only an unreadable file is an error.
    pub fn open_with_config(path: impl AsRef<Path>, config: &OutlineConfig) -> Result<Self> {
        let path = path.as_ref();
        let text = read_text(path)?;
        let language = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(Language::Opaque, |ext| config.language_for_extension(ext));

        Ok(Self::from_text(path, text, language, config.test_markers.clone()))
    }

    /// Outline text that is already in memory; `path` is where writes persist
    pub fn from_text(
        path: impl Into<PathBuf>,
        text: impl Into<String>,
        language: Language,
        markers: TestMarkers,
    ) -> Self {
        let mut handler = Self {
            path: path.into(),
            text: text.into(),
            root: Node::root(0),
            detected: language,
            language,
            parse_failure: None,
            markers,
        };
        handler.reparse();
        handler
    }

    /// Rebuild the whole outline from the current text
    fn reparse(&mut self) {
        match parse_structure(self.detected, &self.text, &self.markers) {
            Ok(root) => {
                self.root = root;
                self.language = self.detected;
                self.parse_failure = None;
            }
            Err(failure) => {
                log::warn!(
                    "Parser failed for {}: {failure}; using opaque outline",
                    self.path.display()
                );
                self.root = Node::root(self.text.len());
                self.language = Language::Opaque;
                self.parse_failure = Some(failure);
            }
        }
        debug_assert_eq!(self.root.span.end, self.text.len());
    }

    /// Text covered by the referenced node
    pub fn get(&self, reference: &Reference) -> Result<&str> {
        let span = reference.resolve(&self.root)?.span;
        Ok(&self.text[span.start..span.end])
    }

    /// Replace the referenced node's text with `content`, persist, reparse
    pub fn write(&mut self, reference: &Reference, content: &str) -> Result<()> {
        let span = reference.resolve(&self.root)?.span;

        let mut new_text =
            String::with_capacity(self.text.len() - span.len() + content.len());
        new_text.push_str(&self.text[..span.start]);
        new_text.push_str(content);
        new_text.push_str(&self.text[span.end..]);

        log::debug!(
            "Writing {} bytes over {}..{} in {}",
            content.len(),
            span.start,
            span.end,
            self.path.display()
        );
        self.persist(new_text)
    }

    /// Append a new item at end of file, persist, reparse.
    ///
    /// `parent` does not choose the insertion point: content always lands at
    /// the end of the file and becomes addressable only if the reparse sees a
    /// top-level declaration in it.
    pub fn add(
        &mut self,
        parent: &Reference,
        kind: ItemKind,
        name: &str,
        content: &str,
    ) -> Result<()> {
        if kind == ItemKind::File {
            return Err(OutlineError::unsupported(self.language.as_str(), "add file"));
        }
        if !self.language.supports_add() {
            return Err(OutlineError::unsupported(self.language.as_str(), "add"));
        }
        if !parent.is_file() {
            log::debug!("Appending {} '{name}' at end of file, not inside '{parent}'", kind);
        }

        let mut new_text = String::with_capacity(self.text.len() + content.len() + 2);
        new_text.push_str(&self.text);
        new_text.push('\n');
        new_text.push_str(content);
        if !content.ends_with('\n') {
            new_text.push('\n');
        }

        self.persist(new_text)
    }

    /// Write the full text to disk, then swap in a freshly parsed outline
    fn persist(&mut self, new_text: String) -> Result<()> {
        std::fs::write(&self.path, &new_text).map_err(|e| OutlineError::io(&self.path, e))?;
        self.text = new_text;
        self.reparse();
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current full text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Read-only outline snapshot
    #[must_use]
    pub const fn outline(&self) -> &Node {
        &self.root
    }

    /// Family used for the current outline
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Family the file extension selected
    #[must_use]
    pub const fn detected_language(&self) -> Language {
        self.detected
    }

    /// Why the structural parse failed, when the handler fell back to opaque
    #[must_use]
    pub const fn parse_failure(&self) -> Option<&ParseFailure> {
        self.parse_failure.as_ref()
    }

    /// Check for a test-tagged node or a top-level name carrying the test prefix
    #[must_use]
    pub fn has_tests(&self) -> bool {
        self.root.tests().next().is_some()
            || self
                .root
                .children
                .keys()
                .any(|name| name.starts_with(self.markers.function_prefix.as_str()))
    }
}

/// Run the family's parser over `text`
fn parse_structure(
    language: Language,
    text: &str,
    markers: &TestMarkers,
) -> std::result::Result<Node, ParseFailure> {
    if language.supports_ast() {
        return AstOutliner::new(language, markers)?.outline(text);
    }
    match language {
        Language::Html => markup::outline(text),
        Language::Css => Ok(stylesheet::outline(text)),
        _ => Ok(Node::root(text.len())),
    }
}

/// Read a file as UTF-8, replacing invalid sequences
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| OutlineError::io(path, e))?;
    Ok(String::from_utf8(bytes).unwrap_or_else(|e| {
        log::debug!("{} is not valid UTF-8, decoding lossily", path.display());
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    }))
}

/// Kind of item requested by an `add`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A new file; only meaningful at workspace level
    File,
    Class,
    Function,
    Method,
    Test,
}

impl ItemKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "class" => Ok(Self::Class),
            "function" => Ok(Self::Function),
            "method" => Ok(Self::Method),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "unknown item kind '{other}' (expected file, class, function, method or test)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn handler(dir: &TempDir, name: &str, text: &str) -> Handler {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        Handler::open(&path).unwrap()
    }

    #[test]
    fn test_whole_file_read_is_exact() {
        let dir = TempDir::new().unwrap();
        for (name, text) in [
            ("a.py", "def f():\n    return 1\n"),
            ("a.js", "class A { m() {} }"),
            ("a.html", "<p id=\"x\">é</p>"),
            ("a.css", "a{}"),
            ("a.txt", "plain ✓ text"),
            ("empty.py", ""),
        ] {
            let h = handler(&dir, name, text);
            assert_eq!(h.get(&Reference::file(name)).unwrap(), text);
            assert_eq!(h.outline().span.end, text.len());
            assert!(h.outline().is_well_nested());
        }
    }

    #[test]
    fn test_write_replaces_exact_span() {
        let dir = TempDir::new().unwrap();
        let original = "def a():\n    return 1\n\n\ndef b():\n    return 2\n";
        let mut h = handler(&dir, "m.py", original);
        let reference = Reference::parse("m.py::a").unwrap();
        let span = h.outline().child("a").unwrap().span;

        h.write(&reference, "def a():\n    return 10").unwrap();

        let expected = format!(
            "{}{}{}",
            &original[..span.start],
            "def a():\n    return 10",
            &original[span.end..]
        );
        assert_eq!(h.text(), expected);
        assert_eq!(std::fs::read_to_string(h.path()).unwrap(), expected);
        assert_eq!(h.get(&reference).unwrap(), "def a():\n    return 10");
        assert!(h.outline().child("b").is_some());
    }

    #[test]
    fn test_write_unknown_reference_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "m.py", "def a():\n    pass\n");
        let err = h
            .write(&Reference::parse("m.py::missing").unwrap(), "x")
            .unwrap_err();
        assert!(matches!(err, OutlineError::UnknownReference { position: 1, .. }));
        assert_eq!(std::fs::read_to_string(h.path()).unwrap(), "def a():\n    pass\n");
    }

    #[test]
    fn test_invalid_source_falls_back_to_opaque() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "bad.py", "def broken(:\n");

        assert_eq!(h.detected_language(), Language::Python);
        assert_eq!(h.language(), Language::Opaque);
        assert!(h.parse_failure().is_some());
        assert!(h.outline().is_leaf());

        let err = h
            .add(&Reference::file("bad.py"), ItemKind::Function, "f", "def f(): pass")
            .unwrap_err();
        assert!(matches!(err, OutlineError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_write_can_repair_and_restructure() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "fix.py", "def broken(:\n");
        h.write(&Reference::file("fix.py"), "def fixed():\n    pass\n")
            .unwrap();

        assert_eq!(h.language(), Language::Python);
        assert!(h.parse_failure().is_none());
        assert_eq!(h.outline().child("fixed").map(|n| n.kind), Some(NodeKind::Function));
    }

    #[test]
    fn test_add_appends_at_end_regardless_of_parent() {
        let dir = TempDir::new().unwrap();
        let original = "class Foo:\n    def bar(self):\n        pass\n";
        let mut h = handler(&dir, "c.py", original);

        h.add(
            &Reference::parse("c.py::Foo::bar").unwrap(),
            ItemKind::Method,
            "baz",
            "def baz():\n    pass",
        )
        .unwrap();

        assert_eq!(h.text(), format!("{original}\ndef baz():\n    pass\n"));
        assert!(h.outline().child("baz").is_some());
        assert!(h.outline().child("Foo").unwrap().child("baz").is_none());
    }

    #[test]
    fn test_add_non_declaration_stays_unaddressed() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "s.css", "a { x: y; }\n");
        h.add(&Reference::file("s.css"), ItemKind::Class, "note", "/* trailing */")
            .unwrap();

        assert_eq!(h.outline().children.len(), 1);
        assert!(h.text().ends_with("/* trailing */\n"));
    }

    #[test]
    fn test_markup_add_unsupported() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "i.html", "<div id=\"a\"></div>");
        let err = h
            .add(&Reference::file("i.html"), ItemKind::Class, "b", "<p id=\"b\"></p>")
            .unwrap_err();
        assert!(matches!(
            err,
            OutlineError::UnsupportedOperation {
                language: "html",
                ..
            }
        ));
    }

    #[test]
    fn test_write_io_failure_keeps_state() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "gone.js", "function f() {}\n");
        std::fs::remove_dir_all(dir.path()).unwrap();

        let err = h
            .write(&Reference::parse("gone.js::f").unwrap(), "function g() {}")
            .unwrap_err();
        assert!(matches!(err, OutlineError::Io { .. }));
        assert_eq!(h.text(), "function f() {}\n");
        assert!(h.outline().child("f").is_some());
    }

    #[test]
    fn test_has_tests() {
        let markers = TestMarkers::default();
        let tested = Handler::from_text(
            "t.py",
            "class TestX:\n    def test_a(self):\n        pass\n",
            Language::Python,
            markers.clone(),
        );
        assert!(tested.has_tests());

        let untested = Handler::from_text("u.py", "def f():\n    pass\n", Language::Python, markers);
        assert!(!untested.has_tests());
    }

    #[test]
    fn test_item_kind_parse() {
        assert_eq!("Method".parse::<ItemKind>().unwrap(), ItemKind::Method);
        assert!("module".parse::<ItemKind>().is_err());
    }
}
