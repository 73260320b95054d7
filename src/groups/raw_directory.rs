//! A group backed by a single directory tree, taken as-is.

use super::{FileGroup, GroupStats};
use crate::filter::FileFilter;
use std::path::{Path, PathBuf};

/// The plain variant of [`FileGroup`]: one root folder, mirrored wholesale
/// subject to the filter.
#[derive(Debug, Clone)]
pub struct RawDirectoryGroup {
    /// Group name, doubling as the destination subfolder segment.
    pub name: String,
    /// Source root folder.
    pub root_folder: PathBuf,
    /// Filter deciding which files under the root participate.
    pub filter: FileFilter,
    /// Whether source-side deletions are propagated to the destination.
    /// Defaults to false: a vanished source file leaves its mirror copy
    /// in place.
    pub propagate_deletions: bool,
    /// Counters written by the engine during a run.
    stats: GroupStats,
}

impl RawDirectoryGroup {
    /// Creates a group over `root_folder`, seeding the filter with the given
    /// exclude lists. The filter remains mutable afterwards.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        root_folder: impl Into<PathBuf>,
        exclude_file_patterns: &[&str],
        exclude_directory_names: &[&str],
    ) -> Self {
        let mut filter = FileFilter::new();
        for pattern in exclude_file_patterns {
            filter.file_name_excludes.push((*pattern).to_string());
        }
        for name in exclude_directory_names {
            filter.subdirectory_excludes.push((*name).to_string());
        }

        Self {
            name: name.into(),
            root_folder: root_folder.into(),
            filter,
            propagate_deletions: false,
            stats: GroupStats::default(),
        }
    }
}

impl FileGroup for RawDirectoryGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    fn filter(&self) -> &FileFilter {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FileFilter {
        &mut self.filter
    }

    fn propagate_deletions(&self) -> bool {
        self.propagate_deletions
    }

    fn stats(&self) -> &GroupStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut GroupStats {
        &mut self.stats
    }
}
