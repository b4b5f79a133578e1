//! File and directory watch registry
//!
//! Watches are stored on trie nodes. Registering a path that already holds
//! a watch hands back the existing one. Closing a watch clears the node's
//! slot but keeps the node, so later registrations reuse it.

use crate::trie::{NodeId, PathTrie};
use crate::{EventKind, Result, WatchError, WatchEvent};
use std::path::Path;
use tracing::{debug, trace};

/// What a watch was registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    /// A single file
    File,
    /// A directory and everything below it
    Directory,
}

/// An active watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    kind: WatchKind,
    generation: u64,
}

impl Watch {
    /// What this watch was registered for
    pub fn kind(&self) -> WatchKind {
        self.kind
    }
}

/// Non-owning reference to a registered watch
///
/// A handle outlived by a close and re-registration of the same path no
/// longer matches and closing it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchHandle {
    node: NodeId,
    generation: u64,
}

impl WatchHandle {
    /// Trie node the watch lives on
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Registry of watches keyed by absolute path
#[derive(Debug, Default)]
pub struct WatchRegistry {
    trie: PathTrie<Watch>,
    next_generation: u64,
    active: usize,
}

impl WatchRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watch on a single file
    pub fn watch_file(&mut self, path: &Path) -> Result<WatchHandle> {
        self.register(path, WatchKind::File)
    }

    /// Register a watch on a directory
    pub fn watch_directory(&mut self, path: &Path) -> Result<WatchHandle> {
        self.register(path, WatchKind::Directory)
    }

    fn register(&mut self, path: &Path, kind: WatchKind) -> Result<WatchHandle> {
        let node = self.trie.insert(path)?;
        if node == NodeId::ROOT {
            return Err(WatchError::Root);
        }

        if let Some(existing) = self.trie.node(node).value() {
            trace!("Reusing {:?} watch: {}", existing.kind, path.display());
            return Ok(WatchHandle {
                node,
                generation: existing.generation,
            });
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.trie.set(node, Watch { kind, generation });
        self.active += 1;

        debug!("Registered {:?} watch: {}", kind, path.display());
        Ok(WatchHandle { node, generation })
    }

    /// Close a watch
    ///
    /// Returns false if the handle no longer refers to the current watch.
    pub fn close(&mut self, handle: &WatchHandle) -> bool {
        let current = self.trie.node(handle.node).value().map(|watch| watch.generation);
        if current != Some(handle.generation) {
            return false;
        }

        self.trie.take(handle.node);
        self.active -= 1;
        debug!("Closed watch: {}", self.trie.node(handle.node).path().display());
        true
    }

    /// Check if exactly `path` holds a watch
    pub fn is_watched(&self, path: &Path) -> bool {
        self.trie
            .find(path)
            .map_or(false, |node| self.trie.node(node).value().is_some())
    }

    /// Nearest watch on `path` or one of its ancestors
    pub fn find(&self, path: &Path) -> Option<(&Path, &Watch)> {
        let node = self.trie.node(self.trie.lookup(path)?);
        Some((node.path(), node.value()?))
    }

    /// Synthesize the event the nearest watch on `path` would have seen
    ///
    /// A file watch reports its own file as modified. A directory watch
    /// reports `path` as created inside it.
    pub fn trigger(&self, path: &Path) -> Option<WatchEvent> {
        let (watched, watch) = self.find(path)?;

        let event = match watch.kind {
            WatchKind::File => WatchEvent {
                watched: watched.to_path_buf(),
                path: watched.to_path_buf(),
                kind: EventKind::Modify,
            },
            WatchKind::Directory => WatchEvent {
                watched: watched.to_path_buf(),
                path: path.to_path_buf(),
                kind: EventKind::Create,
            },
        };

        debug!("Triggering watch {} for {}", watched.display(), path.display());
        Some(event)
    }

    /// Number of active watches
    pub fn len(&self) -> usize {
        self.active
    }

    /// Check if no watch is active
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }
}
