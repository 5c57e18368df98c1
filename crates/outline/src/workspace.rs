use crate::config::OutlineConfig;
use crate::error::{OutlineError, Result};
use crate::handler::{Handler, ItemKind};
use crate::language::Language;
use crate::node::Node;
use crate::reference::Reference;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Set of open handlers under one root, keyed by `/`-separated relative path.
///
/// Opening scans the root once; closing drops every handler, so the next
/// open re-reads everything from disk.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: OutlineConfig,
    handlers: BTreeMap<String, Handler>,
}

impl Workspace {
    /// Scan `root` (.gitignore aware, hidden files skipped) and open every file
    pub fn open(root: impl AsRef<Path>, config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| OutlineError::io(root, e))?;

        let mut workspace = Self {
            root,
            config,
            handlers: BTreeMap::new(),
        };

        for path in workspace.scan() {
            let Some(rel) = relative_key(&workspace.root, &path) else {
                continue;
            };
            match Handler::open_with_config(&path, &workspace.config) {
                Ok(handler) => {
                    workspace.handlers.insert(rel, handler);
                }
                Err(e) => log::warn!("Skipping {rel}: {e}"),
            }
        }

        log::info!(
            "Opened {} files under {}",
            workspace.handlers.len(),
            workspace.root.display()
        );
        Ok(workspace)
    }

    fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false);

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        continue;
                    }
                    let path = entry.path();
                    if self.config.max_file_bytes > 0 {
                        if let Ok(meta) = entry.metadata() {
                            if meta.len() > self.config.max_file_bytes {
                                log::debug!(
                                    "Skipping large file {} ({} bytes > {})",
                                    path.display(),
                                    meta.len(),
                                    self.config.max_file_bytes
                                );
                                continue;
                            }
                        }
                    }
                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths of all open files, sorted
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn handler(&self, rel: &str) -> Option<&Handler> {
        self.handlers.get(rel)
    }

    fn handler_for(&self, reference: &Reference) -> Result<&Handler> {
        self.handlers
            .get(reference.path())
            .ok_or_else(|| OutlineError::UnknownFile(reference.path().to_string()))
    }

    fn handler_for_mut(&mut self, reference: &Reference) -> Result<&mut Handler> {
        self.handlers
            .get_mut(reference.path())
            .ok_or_else(|| OutlineError::UnknownFile(reference.path().to_string()))
    }

    /// Outline of the referenced node (the whole file for a bare path)
    pub fn outline(&self, reference: &Reference) -> Result<&Node> {
        reference.resolve(self.handler_for(reference)?.outline())
    }

    pub fn get(&self, reference: &Reference) -> Result<&str> {
        self.handler_for(reference)?.get(reference)
    }

    pub fn write(&mut self, reference: &Reference, content: &str) -> Result<()> {
        self.handler_for_mut(reference)?.write(reference, content)
    }

    /// Add an item; `ItemKind::File` creates `parent/name` instead of
    /// appending to an open file. Returns the relative path that changed.
    pub fn add(
        &mut self,
        parent: &Reference,
        kind: ItemKind,
        name: &str,
        content: &str,
    ) -> Result<String> {
        if kind == ItemKind::File {
            return self.add_file(parent.path(), name, content);
        }
        self.handler_for_mut(parent)?.add(parent, kind, name, content)?;
        Ok(parent.path().to_string())
    }

    /// Create a new file under `dir` (`.` for the root) and open it
    pub fn add_file(&mut self, dir: &str, name: &str, content: &str) -> Result<String> {
        let rel = if dir.is_empty() || dir == "." {
            PathBuf::from(name)
        } else {
            Path::new(dir).join(name)
        };
        let stays_inside = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || !stays_inside {
            return Err(OutlineError::InvalidReference(format!(
                "'{}' must stay inside the workspace",
                rel.display()
            )));
        }

        let path = self.root.join(&rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OutlineError::io(parent, e))?;
        }
        std::fs::write(&path, content).map_err(|e| OutlineError::io(&path, e))?;

        let handler = Handler::open_with_config(&path, &self.config)?;
        let key = relative_key(&self.root, &path).unwrap_or_else(|| name.to_string());
        log::debug!("Added file {key} ({})", handler.language().as_str());
        self.handlers.insert(key.clone(), handler);
        Ok(key)
    }

    /// Drop one handler; the file is re-read on the next open
    pub fn close_file(&mut self, rel: &str) -> Option<Handler> {
        self.handlers.remove(rel)
    }

    /// Drop every handler
    pub fn close(mut self) {
        let count = self.handlers.len();
        self.handlers.clear();
        log::debug!("Closed {count} files under {}", self.root.display());
    }

    /// Python files with no test-tagged item
    pub fn untested_files(&self) -> Vec<&str> {
        self.handlers
            .iter()
            .filter(|(_, handler)| {
                handler.detected_language() == Language::Python && !handler.has_tests()
            })
            .map(|(rel, _)| rel.as_str())
            .collect()
    }
}

/// `/`-separated path of `path` relative to `root`
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
