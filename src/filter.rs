//! Path-based include/exclude filtering for source groups.
//!
//! A [`FileFilter`] decides whether a file, identified by its path relative
//! to a group's root folder, takes part in a mirror run. Exclusion is purely
//! path-based: file-name patterns are matched against the final path segment
//! and directory names against every intermediate segment. File content is
//! never inspected.

use glob::{MatchOptions, Pattern};
use std::path::{Component, Path};

/// Match options for file-name patterns: case-insensitive, `*` crosses
/// nothing special since only base names are matched.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Mutable include/exclude predicate over relative paths.
///
/// Both lists stay mutable for the lifetime of the owning group, so callers
/// can refine a filter after the group has been constructed.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// Glob-style patterns (e.g. `*.tmp`) matched case-insensitively
    /// against the file's base name only.
    pub file_name_excludes: Vec<String>,

    /// Exact directory-segment names (e.g. `.cache`) matched
    /// case-insensitively against every intermediate directory segment
    /// of the relative path.
    pub subdirectory_excludes: Vec<String>,
}

impl FileFilter {
    /// Creates a filter that excludes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the file at `relative_path` passes the filter.
    ///
    /// A path is included iff no file-name pattern matches its base name
    /// and no intermediate directory segment is an excluded name.
    #[must_use]
    pub fn includes(&self, relative_path: &Path) -> bool {
        if let Some(name) = relative_path.file_name().and_then(|n| n.to_str())
            && self.matches_file_name(name)
        {
            return false;
        }

        // Every component except the final one is a directory segment.
        let mut components = relative_path.components().peekable();
        while let Some(component) = components.next() {
            if components.peek().is_none() {
                break;
            }
            if let Component::Normal(segment) = component
                && let Some(segment) = segment.to_str()
                && self.excludes_directory(segment)
            {
                return false;
            }
        }

        true
    }

    /// Returns true if a directory with this name is excluded outright.
    ///
    /// The scanner uses this to prune whole subtrees without descending
    /// into them.
    #[must_use]
    pub fn excludes_directory(&self, name: &str) -> bool {
        self.subdirectory_excludes
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(name))
    }

    /// Checks the base name against every file-name exclude pattern.
    fn matches_file_name(&self, name: &str) -> bool {
        self.file_name_excludes.iter().any(|pattern| {
            match Pattern::new(pattern) {
                Ok(pattern) => pattern.matches_with(name, MATCH_OPTIONS),
                Err(e) => {
                    // An unparseable pattern excludes nothing.
                    tracing::debug!(pattern = %pattern, error = %e, "ignoring invalid exclude pattern");
                    false
                }
            }
        })
    }
}
