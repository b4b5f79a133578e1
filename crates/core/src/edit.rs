//! Edit scripts for syncing a backend buffer to new file content
//!
//! A backend applies edits one at a time and shifts its own offsets after
//! each one, so every span here is expressed in the coordinates of the
//! buffer as it looks when that span is applied. Replaying the spans in
//! emission order against the old text yields the new text.

use similar::{DiffTag, TextDiff};
use std::time::Duration;

/// Upper bound on time spent searching for a minimal diff.
///
/// Past the deadline the diff is coarser but still correct.
const DIFF_TIMEOUT: Duration = Duration::from_millis(500);

/// A replacement of the half-open byte range `[start, end)` with `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSpan {
    /// Start offset (bytes)
    pub start: usize,
    /// End offset (bytes, exclusive)
    pub end: usize,
    /// Replacement text
    pub text: String,
}

impl EditSpan {
    /// Remove `[start, end)`
    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: String::new(),
        }
    }

    /// Insert `text` at `at`
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }

    /// Check if this span is a pure insertion
    pub fn is_insert(&self) -> bool {
        self.start == self.end
    }
}

/// One run of a character alignment between two texts
///
/// Lengths are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffRun<'a> {
    /// Text present in both revisions
    Equal(usize),
    /// Text only present in the old revision
    Delete(usize),
    /// Text only present in the new revision
    Insert(&'a str),
}

/// Compute the character-level alignment of `old` and `new`
///
/// A replaced region is reported as a delete run followed by an insert run.
pub fn char_runs<'new>(old: &str, new: &'new str) -> Vec<DiffRun<'new>> {
    let diff = TextDiff::configure()
        .timeout(DIFF_TIMEOUT)
        .diff_chars(old, new);

    let old_slices = diff.old_slices();
    let new_slices = diff.new_slices();

    let mut runs = Vec::with_capacity(diff.ops().len());
    let mut new_pos = 0usize;

    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let old_len: usize = old_slices[old_range].iter().map(|s| s.len()).sum();
        let new_len: usize = new_slices[new_range].iter().map(|s| s.len()).sum();
        let inserted = &new[new_pos..new_pos + new_len];

        match tag {
            DiffTag::Equal => runs.push(DiffRun::Equal(new_len)),
            DiffTag::Delete => runs.push(DiffRun::Delete(old_len)),
            DiffTag::Insert => runs.push(DiffRun::Insert(inserted)),
            DiffTag::Replace => {
                runs.push(DiffRun::Delete(old_len));
                runs.push(DiffRun::Insert(inserted));
            }
        }

        new_pos += new_len;
    }

    runs
}

/// Fold an alignment into edit spans
///
/// Equal runs only move the running offset. Deletions never move it, since
/// the removed text is gone from the live buffer once applied. Insertions
/// move it past the inserted text. Empty runs produce nothing.
pub fn edits_from_runs<'a, I>(runs: I) -> Vec<EditSpan>
where
    I: IntoIterator<Item = DiffRun<'a>>,
{
    let mut edits = Vec::new();
    let mut offset = 0usize;

    for run in runs {
        match run {
            DiffRun::Equal(len) => offset += len,
            DiffRun::Delete(0) => {}
            DiffRun::Delete(len) => edits.push(EditSpan::delete(offset, offset + len)),
            DiffRun::Insert("") => {}
            DiffRun::Insert(text) => {
                edits.push(EditSpan::insert(offset, text));
                offset += text.len();
            }
        }
    }

    edits
}

/// Compute the edit spans that turn `old` into `new`
///
/// Returns an empty list when the texts are identical.
pub fn diff_to_edits(old: &str, new: &str) -> Vec<EditSpan> {
    if old == new {
        return Vec::new();
    }
    edits_from_runs(char_runs(old, new))
}

/// A single span replacing the whole buffer
pub fn full_replace(old_len: usize, new: &str) -> Vec<EditSpan> {
    vec![EditSpan {
        start: 0,
        end: old_len,
        text: new.to_string(),
    }]
}

/// Apply spans in order to `buffer`, the way a backend applies edit calls
///
/// # Panics
///
/// Panics if a span lies outside the buffer or off a `char` boundary.
pub fn apply_edits(buffer: &mut String, edits: &[EditSpan]) {
    for edit in edits {
        buffer.replace_range(edit.start..edit.end, &edit.text);
    }
}
