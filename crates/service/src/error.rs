//! Errors raised while resolving files against the backend

use projsync_watcher::WatchError;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Why each default-project match is worth avoiding
const DEFAULT_PROJECT_FILES_EXPLANATION: &str = "\n\nHaving many files run with the default project is known to cause performance issues and slow down linting.";

/// Errors returned by the project service
///
/// Every variant reflects static misconfiguration, so none is retried.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// File is in a configured project and also allow-listed for the default project
    #[error("{} was included by allow_default_project but also was found in the project service. Consider removing it from allow_default_project.", .path.display())]
    AllowlistConflict { path: PathBuf },

    /// File is in no configured project and not allow-listed
    #[error("{} was not found by the project service. Consider either including it in the project config or including it in allow_default_project.", .path.display())]
    NotInProject { path: PathBuf },

    /// Too many files fell back to the default project
    #[error("{}", too_many_files_message(.max, .files, .remaining))]
    TooManyDefaultProjectFiles {
        /// Configured cap
        max: usize,
        /// First matching files, in match order
        files: Vec<PathBuf>,
        /// Matching files left out of `files`
        remaining: usize,
    },

    /// Orphaned file rejected by the orphan policy
    #[error("{} is not covered by any configured project or registered watch, and is not included in allow_default_project.", .path.display())]
    OrphanedFile { path: PathBuf },

    /// The backend could not parse the default project descriptor
    #[error("Could not parse default project '{}': {message}", .path.display())]
    DefaultProject { path: PathBuf, message: String },

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An allow-list glob could not be compiled
    #[error("invalid allow_default_project glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The configuration file could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::ServiceConfig`]
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    /// A watch could not be registered
    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

fn too_many_files_message(max: &usize, files: &[PathBuf], remaining: &usize) -> String {
    let mut message = format!(
        "Too many files (>{}) have matched the default project.{}\nMatching files:\n",
        max, DEFAULT_PROJECT_FILES_EXPLANATION
    );
    for file in files {
        let _ = writeln!(message, "- {}", file.display());
    }
    if *remaining > 0 {
        let _ = writeln!(message, "...and {} more files", remaining);
    }
    message.push_str(
        "\nIf you absolutely need more files included, set maximum_default_project_file_match_count to a larger value.\n",
    );
    message
}

/// Explanation appended to allow-list validation failures
pub(crate) fn default_project_explanation() -> &'static str {
    DEFAULT_PROJECT_FILES_EXPLANATION
}
