use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn create_test_files(dir: impl AsRef<Path>, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let path = dir.as_ref().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }
    Ok(())
}

fn create_zip(path: &Path, members: &[(&str, &str)]) -> Result<()> {
    let mut writer = zip::ZipWriter::new(File::create(path)?);
    for (name, content) in members {
        writer.start_file(*name, zip::write::FileOptions::default())?;
        writer.write_all(content.as_bytes())?;
    }
    writer.finish()?;
    Ok(())
}

fn logscout(root: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("logscout")?;
    cmd.env_remove("RUST_LOG").arg("--root").arg(root);
    Ok(cmd)
}

#[test]
fn test_list_directory() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("app.log", "one\n"), ("sub/nested.log", "two\n")])?;
    create_zip(&dir.path().join("bundle.zip"), &[("a.txt", "hello")])?;

    logscout(dir.path())?
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("app.log"))
        .stdout(predicate::str::contains("bundle.zip"))
        .stdout(predicate::str::contains("3 entries"))
        .stdout(predicate::str::contains("nested.log").not());
    Ok(())
}

#[test]
fn test_list_archive_as_json() -> Result<()> {
    let dir = tempdir()?;
    create_zip(
        &dir.path().join("bundle.zip"),
        &[("a.txt", "hello\nworld"), ("b.txt", "foo")],
    )?;

    let output = logscout(dir.path())?
        .args(["list", "bundle.zip", "--json", "--sort", "size", "--desc"])
        .output()?;
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<_> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(entries[0]["kind"], "file");
    Ok(())
}

#[test]
fn test_find_recursive_regex() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[("app.log", "a\n"), ("app.txt", "b\n"), ("sub/app.log", "c\n")],
    )?;

    logscout(dir.path())?
        .args(["find", "-R", "--match", "regex", "--name", r".*\.log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 entries"))
        .stdout(predicate::str::contains("app.txt").not());
    Ok(())
}

#[test]
fn test_search_reports_hits() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("app.log", "ok\nERROR boom\nerror quiet\n")])?;
    create_zip(&dir.path().join("bundle.zip"), &[("old.log", "ERROR archived\n")])?;

    logscout(dir.path())?
        .args(["search", "ERROR", "-R"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ERROR boom"))
        .stdout(predicate::str::contains("ERROR archived"))
        .stdout(predicate::str::contains("error quiet").not())
        .stdout(predicate::str::contains("Found 2 matches in 2 files"));
    Ok(())
}

#[test]
fn test_search_stats_json() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("app.log", "x\nx\n"), ("other.log", "y\n")])?;

    let output = logscout(dir.path())?
        .args(["search", "", "--stats", "--json"])
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["summary"]["files_with_matches"], 2);
    assert_eq!(value["summary"]["total_matches"], 3);
    assert!(value.get("hits").is_none());
    Ok(())
}

#[test]
fn test_cat_archive_member() -> Result<()> {
    let dir = tempdir()?;
    create_zip(&dir.path().join("bundle.zip"), &[("a.txt", "hello\nworld")])?;

    logscout(dir.path())?
        .args(["cat", "bundle.zip", "A.TXT"])
        .assert()
        .success()
        .stdout("hello\nworld\n");
    Ok(())
}

#[test]
fn test_cat_missing_member_policies() -> Result<()> {
    let dir = tempdir()?;
    create_zip(&dir.path().join("bundle.zip"), &[("a.txt", "hello")])?;

    logscout(dir.path())?
        .args(["cat", "bundle.zip", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"));

    logscout(dir.path())?
        .args(["--missing-entry", "empty", "cat", "bundle.zip", "missing.txt"])
        .assert()
        .success()
        .stdout("");
    Ok(())
}

#[test]
fn test_tail_lines_and_term() -> Result<()> {
    let dir = tempdir()?;
    let body: String = (1..=10).map(|i| format!("line {}\n", i)).collect();
    create_test_files(&dir, &[("app.log", &body)])?;

    logscout(dir.path())?
        .args(["tail", "app.log", "-n", "3"])
        .assert()
        .success()
        .stdout("line 8\nline 9\nline 10\n");

    logscout(dir.path())?
        .args(["tail", ".", "app.log", "-n", "3", "--term", "LINE 9"])
        .assert()
        .success()
        .stdout("line 9\n");
    Ok(())
}

#[test]
fn test_tail_archive_member_prints_notice() -> Result<()> {
    let dir = tempdir()?;
    create_zip(&dir.path().join("bundle.zip"), &[("a.txt", "hello")])?;

    logscout(dir.path())?
        .args(["tail", "bundle.zip", "a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(logscout::TAIL_UNSUPPORTED_MESSAGE));
    Ok(())
}

#[test]
fn test_invalid_options_are_config_errors() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("app.log", "a\n")])?;

    logscout(dir.path())?
        .args(["list", "--sort", "colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));

    logscout(dir.path())?
        .args(["find", "--name", "app", "--match", "glob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("glob"));
    Ok(())
}

#[test]
fn test_config_file_sets_tail_window() -> Result<()> {
    let dir = tempdir()?;
    let body: String = (1..=10).map(|i| format!("line {}\n", i)).collect();
    create_test_files(&dir, &[("app.log", &body)])?;
    let config = dir.path().join("logscout.yaml");
    fs::write(&config, "tail_lines: 2\n")?;

    logscout(dir.path())?
        .arg("--config")
        .arg(&config)
        .args(["tail", "app.log"])
        .assert()
        .success()
        .stdout("line 9\nline 10\n");
    Ok(())
}
