//! The mirror engine.
//!
//! [`MirrorController`] orchestrates an ordered list of source groups
//! against one destination root. For each group, in order, it scans the
//! source tree, applies the cross-group claim rule, classifies every
//! candidate against the destination mirror, performs the copy and delete
//! operations, and accumulates the group's counters. A single file failure
//! never aborts the group or the run: the engine reports it through the
//! progress sink and moves on.
//!
//! Groups are processed strictly sequentially because later groups' claim
//! decisions depend on the registry populated by earlier groups.

use crate::groups::{FileGroup, GroupStats};
use crate::output::ProgressSink;
use crate::scanner::{DirectoryScanner, FileRecord};
use anyhow::{Context, Result};
use filetime::FileTime;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory segments whose stale destination contents are deleted
/// regardless of the owning group's deletion policy. Stale version-control
/// internals are unsafe to retain: a half-mirrored `.hg` folder is worse
/// than none.
const FORCED_DELETE_DIRS: &[&str] = &[".hg"];

/// Whether side effects are applied or only counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Count only; the destination tree is never touched.
    Preview,
    /// Count and perform the copy/delete operations.
    Apply,
}

/// Classification of one candidate against its destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStatus {
    /// No destination file exists.
    New,
    /// Destination exists but size or last-write time differs.
    Updated {
        /// Size of the destination file being replaced.
        old_size: u64,
    },
    /// Destination matches in both size and last-write time.
    Unchanged,
}

/// Orchestrates one mirror run over an ordered list of groups.
///
/// The controller owns its groups and the claimed-path registry. Counters
/// and the registry are tied to a single `run`/`preview` invocation;
/// re-invoking resets them rather than accumulating.
pub struct MirrorController {
    /// Root of the destination tree.
    destination_root: PathBuf,
    /// Groups in processing order. Order is semantically significant:
    /// earlier groups claim paths away from later ones.
    groups: Vec<Box<dyn FileGroup>>,
    /// Per-user namespace segment under the destination root.
    destination_root_for_this_user: String,
    /// Byte threshold between progress ticks. Affects reporting cadence
    /// only, never correctness.
    progress_granularity: u64,
    /// Observer for step and error notifications.
    progress: Arc<dyn ProgressSink>,
    /// Source-relative paths already attributed to an earlier group this
    /// run. Never exposed externally.
    claimed: HashSet<PathBuf>,
    /// True once any recoverable error was reported this run.
    error_encountered: bool,
    /// Cumulative bytes copied this run.
    bytes_copied: u64,
    /// Byte total at the last emitted progress tick.
    last_tick: u64,
}

impl MirrorController {
    /// Creates a controller for one run against `destination_root`.
    ///
    /// The per-user namespace segment defaults to the current username;
    /// override it with [`with_user_label`](Self::with_user_label).
    ///
    /// # Errors
    ///
    /// Returns an error if any group has an empty name, or if two groups
    /// share a name: both would map to the same destination subfolder and
    /// their counters must not be silently merged.
    pub fn new(
        destination_root: impl Into<PathBuf>,
        groups: Vec<Box<dyn FileGroup>>,
        progress_granularity: u64,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for group in &groups {
            if group.name().is_empty() {
                anyhow::bail!("group names cannot be empty");
            }
            if !seen.insert(group.name().to_string()) {
                anyhow::bail!(
                    "duplicate group name '{}': groups sharing a destination root must have unique names",
                    group.name()
                );
            }
        }

        Ok(Self {
            destination_root: destination_root.into(),
            groups,
            destination_root_for_this_user: crate::utils::get_current_user(),
            progress_granularity,
            progress,
            claimed: HashSet::new(),
            error_encountered: false,
            bytes_copied: 0,
            last_tick: 0,
        })
    }

    /// Overrides the per-user namespace segment.
    #[must_use]
    pub fn with_user_label(mut self, label: impl Into<String>) -> Self {
        self.destination_root_for_this_user = label.into();
        self
    }

    /// The namespace segment placed between the destination root and each
    /// group's subfolder.
    #[must_use]
    pub fn destination_root_for_this_user(&self) -> &str {
        &self.destination_root_for_this_user
    }

    /// Read access to the groups, e.g. to inspect stats after a run.
    #[must_use]
    pub fn groups(&self) -> &[Box<dyn FileGroup>] {
        &self.groups
    }

    /// True if the last run reported at least one recoverable error.
    #[must_use]
    pub fn error_encountered(&self) -> bool {
        self.error_encountered
    }

    /// Computes and populates counters for every group without mutating the
    /// destination tree.
    ///
    /// # Errors
    ///
    /// Per-file problems are reported through the sink, never returned;
    /// preview itself has no fatal failure modes.
    pub fn preview(&mut self) -> Result<()> {
        self.execute(Mode::Preview)
    }

    /// Computes counters and performs the copy/delete side effects.
    ///
    /// # Errors
    ///
    /// Returns an error only if the destination root itself cannot be
    /// created. Per-file failures are reported through the sink and set
    /// [`error_encountered`](Self::error_encountered).
    pub fn run(&mut self) -> Result<()> {
        self.execute(Mode::Apply)
    }

    /// Shared driver for both modes.
    fn execute(&mut self, mode: Mode) -> Result<()> {
        self.claimed.clear();
        self.error_encountered = false;
        self.bytes_copied = 0;
        self.last_tick = 0;
        for group in &mut self.groups {
            group.stats_mut().reset();
        }

        if mode == Mode::Apply {
            fs::create_dir_all(&self.destination_root).with_context(|| {
                format!(
                    "failed to create destination root {}",
                    self.destination_root.display()
                )
            })?;
        }

        for index in 0..self.groups.len() {
            self.process_group(index, mode);
        }

        Ok(())
    }

    /// Destination subtree for a group.
    ///
    /// Segments are joined as opaque path components, never formatted, so
    /// characters meaningful to a formatting syntax (`{`, `}`) pass through
    /// untouched.
    fn group_destination(&self, group_name: &str) -> PathBuf {
        self.destination_root
            .join(&self.destination_root_for_this_user)
            .join(group_name)
    }

    /// Scans one group, syncs its candidates, then runs its deletion pass.
    fn process_group(&mut self, index: usize, mode: Mode) {
        let (name, root, filter, propagate_deletions) = {
            let group = &self.groups[index];
            (
                group.name().to_string(),
                group.root_folder().to_path_buf(),
                group.filter().clone(),
                group.propagate_deletions(),
            )
        };
        let group_dest = self.group_destination(&name);
        debug!(group = %name, root = %root.display(), "processing group");

        let mut stats = GroupStats::default();
        // Paths this group's own scan accounted for this run; the deletion
        // pass spares exactly these.
        let mut claimed_here = HashSet::new();

        if root.is_dir() {
            let scanner = DirectoryScanner::with_filter(filter);
            for item in scanner.scan(&root) {
                match item {
                    Ok(record) => self.process_candidate(
                        &record,
                        &group_dest,
                        mode,
                        &mut stats,
                        &mut claimed_here,
                    ),
                    Err(e) => {
                        warn!(group = %name, "skipping unreadable entry: {e:#}");
                        self.progress
                            .verbose(&format!("skipping unreadable entry: {e:#}"));
                    }
                }
            }
        } else {
            self.report_error(&format!(
                "source folder for group '{name}' is missing: {}",
                root.display()
            ));
        }

        self.delete_stale(&group_dest, &claimed_here, propagate_deletions, mode, &mut stats);

        *self.groups[index].stats_mut() = stats;
    }

    /// Applies the claim rule and classification to one candidate, copying
    /// it when needed.
    fn process_candidate(
        &mut self,
        record: &FileRecord,
        group_dest: &Path,
        mode: Mode,
        stats: &mut GroupStats,
        claimed_here: &mut HashSet<PathBuf>,
    ) {
        if self.claimed.contains(&record.relative_path) {
            // Already attributed to an earlier group this run.
            tracing::trace!(path = %record.relative_path.display(), "already claimed");
            return;
        }
        self.claimed.insert(record.relative_path.clone());
        claimed_here.insert(record.relative_path.clone());

        let dest_path = group_dest.join(&record.relative_path);

        match classify(record, &dest_path) {
            FileStatus::Unchanged => {
                self.progress
                    .verbose(&format!("unchanged {}", record.relative_path.display()));
            }
            FileStatus::New => {
                if mode == Mode::Apply
                    && let Err(e) = self.copy_file(record, &dest_path)
                {
                    self.report_error(&format!(
                        "could not copy {}: {e:#}",
                        record.source_path.display()
                    ));
                    return;
                }
                stats.new_files += 1;
                stats.net_change_bytes += signed(record.size);
                self.progress
                    .verbose(&format!("new {}", record.relative_path.display()));
            }
            FileStatus::Updated { old_size } => {
                if mode == Mode::Apply
                    && let Err(e) = self.copy_file(record, &dest_path)
                {
                    self.report_error(&format!(
                        "could not copy {}: {e:#}",
                        record.source_path.display()
                    ));
                    return;
                }
                stats.updated_files += 1;
                stats.net_change_bytes += signed(record.size) - signed(old_size);
                self.progress
                    .verbose(&format!("updated {}", record.relative_path.display()));
            }
        }
    }

    /// Copies one file's bytes and last-write time to the destination,
    /// creating missing parent directories.
    fn copy_file(&mut self, record: &FileRecord, dest_path: &Path) -> Result<()> {
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(&record.source_path, dest_path)
            .with_context(|| format!("failed to write {}", dest_path.display()))?;
        // Replicate the source timestamp so an unchanged file compares
        // equal on the next run.
        filetime::set_file_mtime(dest_path, record.modified)
            .with_context(|| format!("failed to set mtime on {}", dest_path.display()))?;

        self.note_copied(record.size);
        Ok(())
    }

    /// Accumulates copied bytes and emits a progress tick whenever the
    /// total crosses the configured granularity.
    fn note_copied(&mut self, bytes: u64) {
        self.bytes_copied += bytes;
        if self.progress_granularity > 0
            && self.bytes_copied - self.last_tick >= self.progress_granularity
        {
            self.last_tick = self.bytes_copied;
            self.progress.tick(self.bytes_copied);
        }
    }

    /// Deletion pass for one group, run after all its candidates.
    ///
    /// Every file under the group's destination subtree whose relative path
    /// was not reclaimed by this group's scan is stale. Stale files are
    /// deleted iff the group propagates deletions, or unconditionally when
    /// they live inside a version-control metadata directory. The
    /// destination-side walk deliberately ignores the group's filter: any
    /// unreclaimed file is considered.
    fn delete_stale(
        &mut self,
        group_dest: &Path,
        claimed_here: &HashSet<PathBuf>,
        propagate_deletions: bool,
        mode: Mode,
        stats: &mut GroupStats,
    ) {
        if !group_dest.is_dir() {
            return;
        }

        let mut stale = Vec::new();
        for entry in WalkDir::new(group_dest).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable destination entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(group_dest) else {
                continue;
            };
            if claimed_here.contains(relative) {
                continue;
            }
            if propagate_deletions || in_forced_delete_dir(relative) {
                stale.push((entry.path().to_path_buf(), relative.to_path_buf()));
            }
        }

        for (path, relative) in stale {
            match mode {
                Mode::Preview => {
                    stats.deleted_files += 1;
                    self.progress
                        .verbose(&format!("would delete {}", relative.display()));
                }
                Mode::Apply => match fs::remove_file(&path) {
                    Ok(()) => {
                        stats.deleted_files += 1;
                        self.progress
                            .verbose(&format!("deleted {}", relative.display()));
                    }
                    Err(e) => {
                        self.report_error(&format!("could not delete {}: {e}", path.display()));
                    }
                },
            }
        }
    }

    /// Reports a recoverable error and marks the run as having failed
    /// partially.
    fn report_error(&mut self, message: &str) {
        self.error_encountered = true;
        tracing::error!("{message}");
        self.progress.error(message);
    }
}

/// Classifies a candidate against the destination path.
fn classify(record: &FileRecord, dest_path: &Path) -> FileStatus {
    match fs::metadata(dest_path) {
        Err(_) => FileStatus::New,
        Ok(metadata) => {
            let same_size = metadata.len() == record.size;
            let same_mtime =
                FileTime::from_last_modification_time(&metadata) == record.modified;
            if same_size && same_mtime {
                FileStatus::Unchanged
            } else {
                FileStatus::Updated {
                    old_size: metadata.len(),
                }
            }
        }
    }
}

/// True if any intermediate directory segment of `relative_path` is a
/// recognized version-control metadata directory.
fn in_forced_delete_dir(relative_path: &Path) -> bool {
    let mut components = relative_path.components().peekable();
    while let Some(component) = components.next() {
        if components.peek().is_none() {
            break;
        }
        if let Component::Normal(segment) = component
            && let Some(segment) = segment.to_str()
            && FORCED_DELETE_DIRS
                .iter()
                .any(|dir| dir.eq_ignore_ascii_case(segment))
        {
            return true;
        }
    }
    false
}

/// Clamps a byte count into the signed domain used by net-change
/// accounting.
fn signed(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::RawDirectoryGroup;
    use crate::output::NullProgress;

    fn boxed(group: RawDirectoryGroup) -> Box<dyn FileGroup> {
        Box::new(group)
    }

    #[test]
    fn test_duplicate_group_names_rejected() {
        let groups = vec![
            boxed(RawDirectoryGroup::new("docs", "/tmp/a", &[], &[])),
            boxed(RawDirectoryGroup::new("docs", "/tmp/b", &[], &[])),
        ];
        let result =
            MirrorController::new("/tmp/dest", groups, 100, Arc::new(NullProgress::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_group_name_rejected() {
        let groups = vec![boxed(RawDirectoryGroup::new("", "/tmp/a", &[], &[]))];
        let result =
            MirrorController::new("/tmp/dest", groups, 100, Arc::new(NullProgress::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_group_destination_layout() {
        let controller = MirrorController::new(
            "/mnt/backup",
            vec![boxed(RawDirectoryGroup::new("docs", "/home/u/docs", &[], &[]))],
            100,
            Arc::new(NullProgress::new()),
        )
        .unwrap()
        .with_user_label("alice");

        assert_eq!(
            controller.group_destination("docs"),
            PathBuf::from("/mnt/backup/alice/docs")
        );
    }

    #[test]
    fn test_forced_delete_segment_detection() {
        assert!(in_forced_delete_dir(Path::new(".hg/dirstate")));
        assert!(in_forced_delete_dir(Path::new("proj/.HG/store/data")));
        // The final segment is a file name, not a directory.
        assert!(!in_forced_delete_dir(Path::new("proj/.hg")));
        assert!(!in_forced_delete_dir(Path::new("proj/notes/file.txt")));
    }
}
