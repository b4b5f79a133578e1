//! Project service synchronization for projsync
//!
//! Keeps a long-lived analysis backend in step with the files a linter
//! asks about. For every request the session:
//! - Opens the file in the backend, or pushes its new text as edits
//! - Bounds how many files stay open, closing the least recently used
//! - Decides whether the file belongs to a configured or the default project
//! - Caps how many files may fall back to the default project per run

pub mod backend;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod matches;
pub mod session;

pub use backend::{ConfiguredProject, OpenedFile, ProjectBackend, ScriptBuffer, WatchRequest};
pub use cache::OpenFileCache;
pub use classify::{DefaultProjectAllowlist, Membership};
pub use config::{OrphanPolicy, ServiceConfig};
pub use error::{Result, ServiceError};
pub use matches::DefaultProjectMatches;
pub use session::{ParseRequest, ProjectSession, ResolvedProgram, SharedSession};
