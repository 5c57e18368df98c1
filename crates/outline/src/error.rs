use std::path::PathBuf;
use thiserror::Error;

/// Result type for outline operations
pub type Result<T> = std::result::Result<T, OutlineError>;

/// Errors surfaced to callers of a handler or workspace
#[derive(Error, Debug)]
pub enum OutlineError {
    /// A reference segment has no matching child in the current tree
    #[error("Unknown reference piece '{segment}' (segment {position}) in '{reference}'")]
    UnknownReference {
        reference: String,
        segment: String,
        /// 1-based index of the first missing name segment
        position: usize,
    },

    /// The file family does not support the requested mutation
    #[error("Operation '{operation}' is not supported for {language} files")]
    UnsupportedOperation {
        language: &'static str,
        operation: &'static str,
    },

    /// File read/write failure
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file segment of a reference is not open in the workspace
    #[error("Unknown file: {0}")]
    UnknownFile(String),

    /// The reference string does not follow `path(::name)*`
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl OutlineError {
    /// Create an IO error bound to the file it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported operation error
    pub const fn unsupported(language: &'static str, operation: &'static str) -> Self {
        Self::UnsupportedOperation {
            language,
            operation,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Structural parse failure.
///
/// Never returned from the public API: the handler falls back to the opaque
/// variant, logs the failure and keeps it available via
/// [`Handler::parse_failure`](crate::Handler::parse_failure).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// The grammar reported error or missing nodes
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    /// The tag scanner rejected the input
    #[error("markup error at byte {position}: {message}")]
    Markup { position: usize, message: String },

    /// Tree-sitter could not be set up or returned no tree
    #[error("tree-sitter error: {0}")]
    TreeSitter(String),
}

impl ParseFailure {
    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }
}
