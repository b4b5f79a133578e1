//! Path helpers shared by the watcher and the service

use std::path::{Path, PathBuf};

/// Resolve `path` against `cwd` unless it is already absolute
///
/// The result is not canonicalized: symlinks and `..` segments are kept
/// as given, so cache keys match the paths the caller reports.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
