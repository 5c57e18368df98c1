use crate::error::ParseFailure;

/// File family, one per structural parsing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Syntax tree with test-case tagging
    Python,
    /// Depth-first tree-sitter walk
    JavaScript,
    TypeScript,
    Tsx,
    /// Streaming tag scanner, elements addressed by `id`
    Html,
    /// Heuristic selector scanner
    Css,
    /// No structure: the root covers the whole file
    Opaque,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "html" | "htm" => Language::Html,
            "css" => Language::Css,
            _ => Language::Opaque,
        }
    }

    /// Look up a family by its [`as_str`](Self::as_str) name
    pub fn from_name(name: &str) -> Option<Self> {
        let language = match name.to_lowercase().as_str() {
            "python" => Language::Python,
            "javascript" => Language::JavaScript,
            "typescript" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "html" => Language::Html,
            "css" => Language::Css,
            "opaque" => Language::Opaque,
            _ => return None,
        };
        Some(language)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Html => "html",
            Language::Css => "css",
            Language::Opaque => "opaque",
        }
    }

    /// Check if this language is parsed with tree-sitter
    pub fn supports_ast(self) -> bool {
        matches!(
            self,
            Language::Python | Language::JavaScript | Language::TypeScript | Language::Tsx
        )
    }

    /// Check if `add` can append new content to files of this family
    pub fn supports_add(self) -> bool {
        matches!(
            self,
            Language::Python
                | Language::JavaScript
                | Language::TypeScript
                | Language::Tsx
                | Language::Css
        )
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language, ParseFailure> {
        match self {
            Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
            _ => Err(ParseFailure::tree_sitter(format!(
                "no grammar for {}",
                self.as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("PY"), Language::Python);
        assert_eq!(Language::from_extension("mjs"), Language::JavaScript);
        assert_eq!(Language::from_extension("cjs"), Language::JavaScript);
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension("tsx"), Language::Tsx);
        assert_eq!(Language::from_extension("htm"), Language::Html);
        assert_eq!(Language::from_extension("css"), Language::Css);
        assert_eq!(Language::from_extension("md"), Language::Opaque);
    }

    #[test]
    fn test_name_round_trip() {
        for language in [
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Html,
            Language::Css,
            Language::Opaque,
        ] {
            assert_eq!(Language::from_name(language.as_str()), Some(language));
        }
        assert_eq!(Language::from_name("cobol"), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(Language::Python.supports_add());
        assert!(Language::Css.supports_add());
        assert!(!Language::Html.supports_add());
        assert!(!Language::Opaque.supports_add());
        assert!(!Language::Css.supports_ast());
    }

    #[test]
    fn test_tree_sitter_language() {
        assert!(Language::Python.tree_sitter_language().is_ok());
        assert!(Language::JavaScript.tree_sitter_language().is_ok());
        assert!(Language::Tsx.tree_sitter_language().is_ok());
        assert!(Language::Html.tree_sitter_language().is_err());
    }
}
