//! Recursive directory scanner producing candidate file records.
//!
//! The scanner walks a group's root folder, prunes excluded subtrees before
//! descending into them, and yields one [`FileRecord`] per included file.
//! Hidden and dot-prefixed directories (a Mercurial `.hg` folder, say) are
//! walked like any other directory unless the filter excludes them.
//!
//! Unreadable entries surface as `Err` items in the stream; the walk
//! continues with their siblings rather than aborting.

use crate::filter::FileFilter;
use anyhow::{Context, Result};
use filetime::FileTime;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A candidate file produced by one scan.
///
/// Records are produced fresh on every scan and never persisted.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path relative to the scanned root folder.
    pub relative_path: PathBuf,
    /// Absolute path of the source file.
    pub source_path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last-write timestamp.
    pub modified: FileTime,
}

/// Walks a root folder and enumerates the files a group should consider.
#[derive(Debug, Clone, Default)]
pub struct DirectoryScanner {
    /// Filter consulted for every file and directory encountered.
    filter: FileFilter,
}

impl DirectoryScanner {
    /// Creates a scanner that includes every file it finds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scanner that consults `filter` while walking.
    #[must_use]
    pub fn with_filter(filter: FileFilter) -> Self {
        Self { filter }
    }

    /// Lazily enumerates all included files under `root`.
    ///
    /// The returned iterator is one-shot and finite; call `scan` again for a
    /// fresh walk. Directories excluded by the filter are pruned without
    /// being descended into, so arbitrarily deep or inaccessible excluded
    /// subtrees cost nothing.
    pub fn scan<'a>(
        &'a self,
        root: &'a Path,
    ) -> impl Iterator<Item = Result<FileRecord>> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| {
                // Never prune the root itself, even if its name matches an
                // excluded directory.
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                match entry.file_name().to_str() {
                    Some(name) => !self.filter.excludes_directory(name),
                    None => true,
                }
            })
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(anyhow::Error::new(e).context(format!(
                            "failed to read directory entry under {}",
                            root.display()
                        ))));
                    }
                };

                if !entry.file_type().is_file() {
                    return None;
                }

                let relative_path = match entry.path().strip_prefix(root) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => return None,
                };

                if !self.filter.includes(&relative_path) {
                    tracing::trace!(path = %relative_path.display(), "excluded by filter");
                    return None;
                }

                let metadata = match entry.metadata().with_context(|| {
                    format!("failed to read metadata for {}", entry.path().display())
                }) {
                    Ok(metadata) => metadata,
                    Err(e) => return Some(Err(e)),
                };

                Some(Ok(FileRecord {
                    relative_path,
                    source_path: entry.path().to_path_buf(),
                    size: metadata.len(),
                    modified: FileTime::from_last_modification_time(&metadata),
                }))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect_relative(scanner: &DirectoryScanner, root: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = scanner
            .scan(root)
            .filter_map(Result::ok)
            .map(|record| record.relative_path)
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_scan_finds_nested_files() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("a.txt"), "one")?;
        fs::create_dir_all(temp.path().join("sub/deeper"))?;
        fs::write(temp.path().join("sub/b.txt"), "two")?;
        fs::write(temp.path().join("sub/deeper/c.txt"), "three")?;

        let scanner = DirectoryScanner::new();
        let paths = collect_relative(&scanner, temp.path());

        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("sub/b.txt"),
                PathBuf::from("sub/deeper/c.txt"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_scan_records_size_and_absolute_path() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("data.bin"), b"12345")?;

        let scanner = DirectoryScanner::new();
        let records: Vec<FileRecord> = scanner
            .scan(temp.path())
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].size, 5);
        assert_eq!(records[0].source_path, temp.path().join("data.bin"));
        Ok(())
    }

    #[test]
    fn test_scan_walks_dot_directories() -> Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(".hg"))?;
        fs::write(temp.path().join(".hg/dirstate"), "state")?;

        let scanner = DirectoryScanner::new();
        let paths = collect_relative(&scanner, temp.path());

        assert_eq!(paths, vec![PathBuf::from(".hg/dirstate")]);
        Ok(())
    }

    #[test]
    fn test_excluded_directory_is_pruned() -> Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir_all(temp.path().join("sub/inner"))?;
        fs::write(temp.path().join("sub/one.txt"), "x")?;
        fs::write(temp.path().join("sub/inner/two.txt"), "y")?;
        fs::write(temp.path().join("keep.txt"), "z")?;

        let mut filter = FileFilter::new();
        filter.subdirectory_excludes.push("sub".to_string());
        let scanner = DirectoryScanner::with_filter(filter);
        let paths = collect_relative(&scanner, temp.path());

        assert_eq!(paths, vec![PathBuf::from("keep.txt")]);
        Ok(())
    }

    #[test]
    fn test_file_pattern_exclusion() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("notes.txt"), "a")?;
        fs::write(temp.path().join("NOTES.TXT"), "b")?;
        fs::write(temp.path().join("data.info"), "c")?;

        let mut filter = FileFilter::new();
        filter.file_name_excludes.push("*.txt".to_string());
        let scanner = DirectoryScanner::with_filter(filter);
        let paths = collect_relative(&scanner, temp.path());

        assert_eq!(paths, vec![PathBuf::from("data.info")]);
        Ok(())
    }

    #[test]
    fn test_missing_root_surfaces_error_without_panicking() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let scanner = DirectoryScanner::new();
        let results: Vec<Result<FileRecord>> = scanner.scan(&missing).collect();

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_does_not_abort_walk() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join("locked"))?;
        fs::write(temp.path().join("locked/hidden.txt"), "x")?;
        fs::write(temp.path().join("visible.txt"), "y")?;
        fs::set_permissions(temp.path().join("locked"), fs::Permissions::from_mode(0o000))?;

        if fs::read_dir(temp.path().join("locked")).is_ok() {
            // Permissions are not enforced for this user (running as root);
            // nothing to observe.
            fs::set_permissions(temp.path().join("locked"), fs::Permissions::from_mode(0o755))?;
            return Ok(());
        }

        let scanner = DirectoryScanner::new();
        let results: Vec<Result<FileRecord>> = scanner.scan(temp.path()).collect();

        // Restore permissions so TempDir can clean up.
        fs::set_permissions(temp.path().join("locked"), fs::Permissions::from_mode(0o755))?;

        let ok: Vec<PathBuf> = results
            .iter()
            .filter_map(|r| r.as_ref().ok().map(|record| record.relative_path.clone()))
            .collect();
        assert!(ok.contains(&PathBuf::from("visible.txt")));
        assert!(results.iter().any(Result::is_err));
        Ok(())
    }
}
