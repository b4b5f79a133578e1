//! Watch registrations for projsync
//!
//! The backend never gets live disk access, so it cannot learn about
//! files that appear after startup. Instead it registers watches here and
//! the session replays a synthetic event when a file shows up that no
//! configured project covers. This crate provides:
//! - A path-segment trie with nearest-ancestor lookup
//! - A registry of file and directory watches on top of it

pub mod registry;
pub mod trie;

use std::path::PathBuf;

pub use registry::{Watch, WatchHandle, WatchKind, WatchRegistry};
pub use trie::{NodeId, PathTrie, TrieNode};

/// Errors raised while registering watches
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Only absolute paths can be registered
    #[error("absolute paths only: {0}")]
    RelativePath(PathBuf),
    /// `..` segments are not resolved by the trie
    #[error("path contains parent directory segments: {0}")]
    NotNormalized(PathBuf),
    /// The filesystem root cannot be watched
    #[error("cannot watch the filesystem root")]
    Root,
}

/// Result type for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Synthetic file system event replayed to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path the watch was registered on
    pub watched: PathBuf,
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Entry created inside a watched directory
    Create,
    /// Watched file modified
    Modify,
}
