//! Utility functions and helpers.
//!
//! Small path and formatting helpers shared by the CLI and the engine:
//! tilde expansion, human-readable sizes, and user identification.

use anyhow::Result;
use std::path::PathBuf;

/// Expands a path starting with `~` to the user's home directory.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        anyhow::bail!("Path cannot be empty");
    }
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home.join(&path[2..]));
    }
    Ok(PathBuf::from(path))
}

/// Formats a file size in bytes into a human-readable string with
/// appropriate units.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size.round() as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Formats a signed byte delta, keeping the sign visible.
#[must_use]
pub fn format_signed_size(delta: i64) -> String {
    if delta < 0 {
        format!("-{}", format_size(delta.unsigned_abs()))
    } else {
        format!("+{}", format_size(delta.unsigned_abs()))
    }
}

/// Retrieves the current system username, falling back to "unknown" if not
/// found.
#[must_use]
pub fn get_current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_plain_path() {
        assert_eq!(
            expand_tilde("/tmp/data").unwrap(),
            PathBuf::from("/tmp/data")
        );
    }

    #[test]
    fn test_expand_tilde_home_relative() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/docs").unwrap(), home.join("docs"));
        }
    }

    #[test]
    fn test_expand_tilde_empty_is_error() {
        assert!(expand_tilde("").is_err());
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_signed_size() {
        assert_eq!(format_signed_size(512), "+512 B");
        assert_eq!(format_signed_size(-2048), "-2.00 KB");
        assert_eq!(format_signed_size(0), "+0 B");
    }
}
