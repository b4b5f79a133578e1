//! Files resolved through the default project during one linting run

use crate::error::{Result, ServiceError};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

/// How many matching files an overuse error lists
pub const FILE_PRINT_LIMIT: usize = 20;

/// Insertion-ordered set of default-project files
///
/// Only grows during a run. Going over the cap is fatal.
#[derive(Debug, Clone, Default)]
pub struct DefaultProjectMatches {
    files: IndexSet<PathBuf>,
}

impl DefaultProjectMatches {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` and enforce the cap of `max` files
    ///
    /// The path stays recorded even when the cap is exceeded, so every
    /// later request keeps failing until the run ends.
    pub fn record(&mut self, path: &Path, max: usize) -> Result<()> {
        self.insert(path);
        self.check(max)
    }

    /// Record `path` without checking the cap
    ///
    /// Returns `false` if it was already recorded.
    pub fn insert(&mut self, path: &Path) -> bool {
        if self.files.contains(path) {
            return false;
        }
        self.files.insert(path.to_path_buf())
    }

    /// Fail if more than `max` files are recorded
    pub fn check(&self, max: usize) -> Result<()> {
        if self.files.len() <= max {
            return Ok(());
        }

        let files: Vec<PathBuf> = self.files.iter().take(FILE_PRINT_LIMIT).cloned().collect();
        let remaining = self.files.len() - files.len();
        Err(ServiceError::TooManyDefaultProjectFiles {
            max,
            files,
            remaining,
        })
    }

    /// Check if `path` was recorded
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Recorded files, in match order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Number of recorded files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Forget every recorded file
    pub fn clear(&mut self) {
        self.files.clear();
    }
}
