//! Configuration parsing and group construction.
//!
//! The config file is TOML: one `[destination]` table and an ordered list
//! of `[[groups]]` entries. Group order in the file is the processing
//! order, which matters — earlier groups claim overlapping files away from
//! later ones.
//!
//! ```toml
//! [destination]
//! root = "/mnt/backup"
//! # user_label = "alice"        # defaults to the current username
//!
//! [[groups]]
//! name = "documents"
//! root = "~/Documents"
//! exclude_files = ["*.tmp"]
//! exclude_dirs = [".cache"]
//! propagate_deletions = false
//! ```

use crate::groups::{FileGroup, RawDirectoryGroup};
use crate::utils::expand_tilde;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file path relative to the home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/dirsafe/config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where the mirror lives.
    pub destination: DestinationConfig,

    /// Source groups in processing order.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,

    /// Progress-reporting knobs.
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Destination tree settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DestinationConfig {
    /// Root folder of the destination tree. Tilde-expanded.
    pub root: String,

    /// Namespace segment placed under the root; defaults to the current
    /// username when absent.
    #[serde(default)]
    pub user_label: Option<String>,
}

/// One source group definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name; becomes the destination subfolder segment.
    pub name: String,

    /// Source root folder. Tilde-expanded.
    pub root: String,

    /// Glob patterns for file names to exclude (case-insensitive).
    #[serde(default)]
    pub exclude_files: Vec<String>,

    /// Directory-segment names to exclude (case-insensitive, pruned).
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Whether files removed from the source are also removed from the
    /// mirror.
    #[serde(default)]
    pub propagate_deletions: bool,
}

/// Progress-reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Bytes copied between progress ticks. Affects reporting cadence only.
    #[serde(default = "default_granularity_bytes")]
    pub granularity_bytes: u64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            granularity_bytes: default_granularity_bytes(),
        }
    }
}

/// One tick per mebibyte copied.
const fn default_granularity_bytes() -> u64 {
    1_048_576
}

impl Config {
    /// Loads configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration file location (`~/.config/dirsafe/config.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(DEFAULT_CONFIG_PATH))
    }

    /// Expanded destination root.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured root is empty.
    pub fn destination_root(&self) -> Result<PathBuf> {
        expand_tilde(&self.destination.root).context("destination.root is not usable")
    }

    /// Builds the ordered group list the engine consumes.
    ///
    /// # Errors
    ///
    /// Returns an error if any group root is empty.
    pub fn build_groups(&self) -> Result<Vec<Box<dyn FileGroup>>> {
        let mut groups: Vec<Box<dyn FileGroup>> = Vec::with_capacity(self.groups.len());
        for entry in &self.groups {
            let root = expand_tilde(&entry.root)
                .with_context(|| format!("group '{}' has no usable root", entry.name))?;
            let exclude_files: Vec<&str> =
                entry.exclude_files.iter().map(String::as_str).collect();
            let exclude_dirs: Vec<&str> =
                entry.exclude_dirs.iter().map(String::as_str).collect();

            let mut group =
                RawDirectoryGroup::new(entry.name.clone(), root, &exclude_files, &exclude_dirs);
            group.propagate_deletions = entry.propagate_deletions;
            groups.push(Box::new(group));
        }
        Ok(groups)
    }

    /// Structural checks that do not require touching the filesystem.
    fn validate(&self) -> Result<()> {
        if self.destination.root.is_empty() {
            anyhow::bail!("destination.root must be set");
        }
        for entry in &self.groups {
            if entry.name.is_empty() {
                anyhow::bail!("every group needs a non-empty name");
            }
            if entry.root.is_empty() {
                anyhow::bail!("group '{}' needs a non-empty root", entry.name);
            }
        }
        Ok(())
    }
}
