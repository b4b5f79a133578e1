//! Path-segment trie
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A node is
//! created the first time any path through it is inserted and is never
//! removed; only its value comes and goes.

use crate::{Result, WatchError};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};

/// Index of a node in a [`PathTrie`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The filesystem root
    pub const ROOT: NodeId = NodeId(0);
}

/// One path segment
#[derive(Debug)]
pub struct TrieNode<T> {
    /// Absolute path up to and including this segment
    path: PathBuf,
    /// Child segments, ordered by name
    children: BTreeMap<OsString, NodeId>,
    /// Attached value, if any
    value: Option<T>,
}

impl<T> TrieNode<T> {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            children: BTreeMap::new(),
            value: None,
        }
    }

    /// Absolute path of this node
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Attached value
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Child segment names, in order
    pub fn child_names(&self) -> impl Iterator<Item = &OsStr> {
        self.children.keys().map(OsString::as_os_str)
    }
}

/// Trie keyed by absolute path segments
#[derive(Debug)]
pub struct PathTrie<T> {
    nodes: Vec<TrieNode<T>>,
}

impl<T> PathTrie<T> {
    /// Create a trie holding only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new(PathBuf::from(MAIN_SEPARATOR_STR))],
        }
    }

    /// Insert every segment of `path` and return the terminal node
    ///
    /// Inserting an existing path returns the existing node.
    pub fn insert(&mut self, path: &Path) -> Result<NodeId> {
        let mut current = NodeId::ROOT;

        for segment in segments(path)? {
            current = match self.nodes[current.0].children.get(segment) {
                Some(&child) => child,
                None => {
                    let child = NodeId(self.nodes.len());
                    let child_path = self.nodes[current.0].path.join(segment);
                    self.nodes.push(TrieNode::new(child_path));
                    self.nodes[current.0]
                        .children
                        .insert(segment.to_os_string(), child);
                    child
                }
            };
        }

        Ok(current)
    }

    /// Find the node for exactly `path`, if it was ever inserted
    pub fn find(&self, path: &Path) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for segment in segments(path).ok()? {
            current = *self.nodes[current.0].children.get(segment)?;
        }
        Some(current)
    }

    /// Deepest node along `path` that carries a value
    ///
    /// The node may be an ancestor of `path`. The walk stops at the first
    /// segment that was never inserted. The root is never returned.
    pub fn lookup(&self, path: &Path) -> Option<NodeId> {
        let segments = segments(path).ok()?;
        let mut current = NodeId::ROOT;
        let mut deepest = None;

        for segment in segments {
            let Some(&child) = self.nodes[current.0].children.get(segment) else {
                break;
            };
            if self.nodes[child.0].value.is_some() {
                deepest = Some(child);
            }
            current = child;
        }

        deepest
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> &TrieNode<T> {
        &self.nodes[id.0]
    }

    /// Attach a value, returning the previous one
    pub fn set(&mut self, id: NodeId, value: T) -> Option<T> {
        self.nodes[id.0].value.replace(value)
    }

    /// Detach the value, keeping the node
    pub fn take(&mut self, id: NodeId) -> Option<T> {
        self.nodes[id.0].value.take()
    }

    /// Number of nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an absolute path into trie segments
fn segments(path: &Path) -> Result<Vec<&OsStr>> {
    if !path.is_absolute() {
        return Err(WatchError::RelativePath(path.to_path_buf()));
    }

    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => segments.push(prefix.as_os_str()),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => return Err(WatchError::NotNormalized(path.to_path_buf())),
            Component::Normal(segment) => segments.push(segment),
        }
    }
    Ok(segments)
}
