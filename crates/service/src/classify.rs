//! Project membership classification
//!
//! Decides whether a file belongs to a configured project or may fall back
//! to the default project, and rejects contradictory configurations.

use crate::backend::{ConfiguredProject, OpenedFile, ProjectBackend};
use crate::error::{Result, ServiceError};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::debug;

/// Check if any configured project currently contains `path`
///
/// The backend adds and drops projects as files open, so this always walks
/// the live list.
pub fn is_in_configured_project<B: ProjectBackend>(backend: &B, path: &Path) -> bool {
    backend
        .configured_projects()
        .iter()
        .any(|project| project.contains_file(path))
}

/// Globs of files allowed to use the default project
///
/// `*` and `?` never match a path separator.
#[derive(Debug, Clone)]
pub struct DefaultProjectAllowlist {
    patterns: Vec<String>,
    set: GlobSet,
}

impl DefaultProjectAllowlist {
    /// Compile `patterns`
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| ServiceError::InvalidGlob {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|source| ServiceError::InvalidGlob {
            pattern: patterns.join(", "),
            source,
        })?;

        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// Check if `path` matches any pattern as given
    pub fn matches(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }

    /// Check if `path`, taken relative to `root` when below it, matches
    pub fn matches_relative_to(&self, path: &Path, root: &Path) -> bool {
        let candidate = path.strip_prefix(root).unwrap_or(path);
        self.matches(candidate)
    }

    /// Configured patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check if no pattern is configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Where a resolved file gets its compiler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// A configured project claimed the file
    ConfiguredProject,
    /// The file fell back to the default project
    DefaultProject,
}

/// Facts gathered about one file before classification
#[derive(Debug, Clone, Copy)]
pub struct MembershipFacts<'a> {
    /// Absolute path of the file
    pub path: &'a Path,
    /// Backend result of opening the file
    pub opened: &'a OpenedFile,
    /// A configured project lists the file
    pub in_configured_project: bool,
    /// The file matches the default-project allow-list
    pub allowlisted: bool,
}

/// Apply the membership policy
///
/// With full type information required, a file may not be both in a
/// configured project and allow-listed, and a file in no project must be
/// allow-listed.
pub fn classify(facts: MembershipFacts<'_>, requires_full_type_info: bool) -> Result<Membership> {
    let membership = if facts.opened.uses_default_project() {
        Membership::DefaultProject
    } else {
        Membership::ConfiguredProject
    };

    if !requires_full_type_info {
        return Ok(membership);
    }

    debug!(
        "Default project allowed path: {}, based on config file: {:?}",
        facts.allowlisted, facts.opened.config_file
    );

    let resolvable = facts.in_configured_project || membership == Membership::ConfiguredProject;

    if facts.in_configured_project && facts.allowlisted {
        return Err(ServiceError::AllowlistConflict {
            path: facts.path.to_path_buf(),
        });
    }

    if !facts.allowlisted && !resolvable {
        return Err(ServiceError::NotInProject {
            path: facts.path.to_path_buf(),
        });
    }

    Ok(membership)
}
