//! Per-node traversal state handed to client hooks.

use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::filter::EntryInfo;
use crate::stats::ObjectType;

/// What a client hook wants the crawler to do with the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Directive {
    /// Carry on normally.
    #[default]
    Continue,
    /// Leave this node alone. For a directory, nothing below it is visited.
    Skip,
    /// Delete this node (recursively for a directory). Honours dry-run.
    Delete,
    /// Stop the whole crawl.
    Abort,
}

/// The action pending on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientAction {
    #[default]
    Browse,
    Skip,
    Delete,
}

/// Build the virtual path of `path` relative to `root`: `/`-separated and
/// rooted at `/`. The root itself maps to `/`.
pub fn virtual_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut out = String::from("/");
    let mut first = true;
    for component in relative.components() {
        if let Component::Normal(part) = component {
            if !first {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
            first = false;
        }
    }
    out
}

/// Mutable state of the file currently being visited.
///
/// The crawler keeps one instance and resets it for every file.
#[derive(Debug, Clone, Default)]
pub struct FileTraversalMetadata {
    pub path: PathBuf,
    pub virtual_path: String,
    pub name: CompactString,
    pub size: Option<u64>,
    pub depth: usize,
    pub action: ClientAction,
    /// Set when a hook returned [`Directive::Skip`].
    pub client_skipped: bool,
}

impl FileTraversalMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-initialise for the next file.
    pub fn reset(&mut self, root: &Path, path: &Path, size: Option<u64>, depth: usize) {
        self.path.clear();
        self.path.push(path);
        self.virtual_path = virtual_path(root, path);
        self.name = file_name(path);
        self.size = size;
        self.depth = depth;
        self.action = ClientAction::Browse;
        self.client_skipped = false;
    }

    /// The filter view of this file.
    pub fn entry_info(&self) -> EntryInfo<'_> {
        EntryInfo {
            path: &self.path,
            name: self.name.as_str(),
            virtual_path: &self.virtual_path,
            object_type: ObjectType::File,
            size: self.size,
            depth: self.depth,
        }
    }

    /// Record a hook's directive on this node.
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Skip => {
                self.action = ClientAction::Skip;
                self.client_skipped = true;
            }
            Directive::Delete => self.action = ClientAction::Delete,
            Directive::Continue | Directive::Abort => {}
        }
    }
}

/// Mutable state of a directory being visited.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTraversalMetadata {
    pub path: PathBuf,
    pub virtual_path: String,
    pub name: CompactString,
    pub depth: usize,
    pub is_root: bool,
    pub action: ClientAction,
    /// Set when a hook returned [`Directive::Skip`].
    pub client_skipped: bool,
    /// Set when the whole subtree below this directory is skipped.
    pub recursively_skipped: bool,
}

impl DirectoryTraversalMetadata {
    pub fn new(root: &Path, path: &Path, depth: usize) -> Self {
        let mut meta = Self::default();
        meta.reset(root, path, depth);
        meta
    }

    /// Re-initialise for the next directory.
    pub fn reset(&mut self, root: &Path, path: &Path, depth: usize) {
        self.path.clear();
        self.path.push(path);
        self.virtual_path = virtual_path(root, path);
        self.name = file_name(path);
        self.depth = depth;
        self.is_root = depth == 0;
        self.action = ClientAction::Browse;
        self.client_skipped = false;
        self.recursively_skipped = false;
    }

    /// The filter view of this directory.
    pub fn entry_info(&self) -> EntryInfo<'_> {
        EntryInfo {
            path: &self.path,
            name: self.name.as_str(),
            virtual_path: &self.virtual_path,
            object_type: ObjectType::Directory,
            size: None,
            depth: self.depth,
        }
    }

    /// Record a hook's directive on this node.
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Skip => {
                self.action = ClientAction::Skip;
                self.client_skipped = true;
                self.recursively_skipped = true;
            }
            Directive::Delete => self.action = ClientAction::Delete,
            Directive::Continue | Directive::Abort => {}
        }
    }
}

fn file_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}
