//! The analysis backend seam
//!
//! The backend is a long-lived, in-process project service: it parses and
//! type-checks files, groups them into projects and hands out compiled
//! programs. projsync only drives it through the traits below. Methods
//! take `&self` because the backend is shared with the open-file cache's
//! eviction callback; implementations keep their own interior state.

use projsync_watcher::{WatchEvent, WatchKind};
use std::path::{Path, PathBuf};

/// Result of opening a file in the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenedFile {
    /// Config file of the configured project that claimed the file
    ///
    /// `None` means the file landed in the default project.
    pub config_file: Option<PathBuf>,
}

impl OpenedFile {
    /// A file claimed by the project configured in `config_file`
    pub fn in_project(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: Some(config_file.into()),
        }
    }

    /// A file that fell back to the default project
    pub fn in_default_project() -> Self {
        Self { config_file: None }
    }

    /// Check if the file fell back to the default project
    pub fn uses_default_project(&self) -> bool {
        self.config_file.is_none()
    }
}

/// A watch the backend asked for while opening a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRequest {
    /// File or directory to watch
    pub path: PathBuf,
    pub kind: WatchKind,
}

impl WatchRequest {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: WatchKind::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: WatchKind::Directory,
        }
    }
}

/// Live text of an open file inside the backend
///
/// Offsets are byte offsets into the current text. The backend shifts its
/// offsets after every applied edit.
pub trait ScriptBuffer {
    /// Current length in bytes
    fn len(&self) -> usize;

    /// Check if the buffer is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text in `[start, end)`
    fn text(&self, start: usize, end: usize) -> String;

    /// Replace `[start, end)` with `replacement`
    fn apply_edit(&self, start: usize, end: usize, replacement: &str);
}

/// A project the backend built from a config file
pub trait ConfiguredProject {
    /// Config file the project was loaded from
    fn config_file(&self) -> &Path;

    /// Check if the project includes `path`
    fn contains_file(&self, path: &Path) -> bool;
}

/// The analysis backend
pub trait ProjectBackend: Send + Sync {
    /// Handle on an open file's live text
    type Buffer: ScriptBuffer;
    /// Handle on a configured project
    type Project: ConfiguredProject;
    /// Compiled representation of a file
    type Program;

    /// Directory relative request paths are resolved against
    fn current_directory(&self) -> PathBuf;

    /// Open `path` with `text`, letting the backend pick its project
    fn open_file(&self, path: &Path, text: &str, project_root: Option<&Path>) -> OpenedFile;

    /// Close a file opened with [`ProjectBackend::open_file`]
    fn close_file(&self, path: &Path);

    /// Live buffer for `path`, if the backend still holds one
    fn buffer(&self, path: &Path) -> Option<Self::Buffer>;

    /// Configured projects currently loaded
    ///
    /// The list changes as files are opened, so callers re-query it.
    fn configured_projects(&self) -> Vec<Self::Project>;

    /// Compiled program for `path` from its default project
    ///
    /// `None` while the project is still loading or the file is unknown.
    fn program_for_file(&self, path: &Path) -> Option<Self::Program>;

    /// Replace the set of extra recognized file extensions
    fn set_extra_file_extensions(&self, extensions: &[String]);

    /// Use the project descriptor at `config_path` for default-project files
    fn set_default_project(&self, config_path: &Path) -> anyhow::Result<()>;

    /// Deliver a synthetic watch event
    fn notify_watch(&self, event: &WatchEvent);

    /// Watches requested since the last call
    ///
    /// The session drains these after every [`ProjectBackend::open_file`],
    /// since loading a project is when the backend learns what to watch.
    fn take_watch_requests(&self) -> Vec<WatchRequest> {
        Vec::new()
    }
}
