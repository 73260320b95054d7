use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Writes a config file mirroring `source` into `dest` under one group.
fn write_config(dir: &std::path::Path, source: &std::path::Path, dest: &std::path::Path) -> std::path::PathBuf {
    let config_path = dir.join("config.toml");
    let config = format!(
        r#"
[destination]
root = "{}"
user_label = "tester"

[[groups]]
name = "docs"
root = "{}"
exclude_files = ["*.tmp"]
"#,
        dest.display(),
        source.display()
    );
    fs::write(&config_path, config).expect("write config");
    config_path
}

#[test]
fn test_run_mirrors_configured_group() -> Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("source");
    let dest = temp.path().join("dest");
    fs::create_dir_all(&source)?;
    fs::write(source.join("keep.txt"), "important")?;
    fs::write(source.join("scratch.tmp"), "disposable")?;

    let config_path = write_config(temp.path(), &source, &dest);

    Command::cargo_bin("dirsafe")?
        .args(["run", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Mirror complete"));

    assert!(dest.join("tester/docs/keep.txt").exists());
    assert!(!dest.join("tester/docs/scratch.tmp").exists());
    Ok(())
}

#[test]
fn test_preview_reports_without_writing() -> Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("source");
    let dest = temp.path().join("dest");
    fs::create_dir_all(&source)?;
    fs::write(source.join("keep.txt"), "important")?;

    let config_path = write_config(temp.path(), &source, &dest);

    Command::cargo_bin("dirsafe")?
        .args(["preview", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 new"));

    assert!(!dest.exists());
    Ok(())
}

#[test]
fn test_missing_config_is_a_fatal_error() -> Result<()> {
    let temp = TempDir::new()?;
    let absent = temp.path().join("absent.toml");

    Command::cargo_bin("dirsafe")?
        .args(["run", "--config", absent.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
    Ok(())
}

#[test]
fn test_run_without_groups_warns_and_succeeds() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[destination]
root = "/tmp/dirsafe-unused"
"#,
    )?;

    Command::cargo_bin("dirsafe")?
        .args(["run", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("No groups configured"));
    Ok(())
}

#[test]
fn test_second_run_reports_nothing_new() -> Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("source");
    let dest = temp.path().join("dest");
    fs::create_dir_all(&source)?;
    fs::write(source.join("keep.txt"), "important")?;

    let config_path = write_config(temp.path(), &source, &dest);

    Command::cargo_bin("dirsafe")?
        .args(["run", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 new"));

    Command::cargo_bin("dirsafe")?
        .args(["run", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("0 new"));
    Ok(())
}
