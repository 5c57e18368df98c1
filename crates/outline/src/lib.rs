//! # Context Outline
//!
//! Addressable structure over source files: every file becomes a tree of named
//! regions with exact byte spans, which can be read, replaced or appended to.
//!
//! ## Architecture
//!
//! ```text
//! File path + bytes
//!     │
//!     ├──> Language Detection (from extension, config overrides)
//!     │
//!     ├──> Structural Parse → Node tree (byte spans)
//!     │    ├─> Python       tree-sitter, test tagging
//!     │    ├─> JS / TS      tree-sitter depth-first walk
//!     │    ├─> HTML         quick-xml scan, elements by id
//!     │    ├─> CSS          selector heuristic
//!     │    └─> Opaque       root only (also the fallback on parse failure)
//!     │
//!     └──> Handler
//!          ├─> get    resolve `path::name::...` → text slice
//!          ├─> write  splice span → persist → full reparse
//!          └─> add    append at end of file → persist → full reparse
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_outline::{Handler, Reference};
//!
//! # fn main() -> context_outline::Result<()> {
//! let mut handler = Handler::open("src/app.py")?;
//! let reference = Reference::parse("src/app.py::App::run")?;
//!
//! println!("{}", handler.get(&reference)?);
//! handler.write(&reference, "def run(self):\n        return 0")?;
//! # Ok(())
//! # }
//! ```

mod ast_outliner;
mod config;
mod error;
mod handler;
mod language;
mod markup;
mod node;
mod reference;
mod span;
mod stylesheet;
mod workspace;

pub use config::{OutlineConfig, TestMarkers};
pub use error::{OutlineError, ParseFailure, Result};
pub use handler::{Handler, ItemKind};
pub use language::Language;
pub use node::{Node, NodeKind, ROOT_NAME};
pub use reference::{Reference, SEPARATOR};
pub use span::{LineIndex, Span};
pub use workspace::Workspace;
