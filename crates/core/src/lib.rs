//! projsync core - text synchronization primitives
//!
//! This crate provides the pieces every backend sync needs:
//! - Character-level edit scripts between two revisions of a file
//! - Sequential edit replay with backend offset semantics
//! - Path absolutization without canonicalization

pub mod edit;
pub mod path;

// Re-export main types for convenience
pub use edit::{apply_edits, char_runs, diff_to_edits, edits_from_runs, full_replace, DiffRun, EditSpan};
pub use path::absolutize;
