use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const GENERIC_GO_HEADER: &str =
  "// SPDX-FileCopyrightText: Contributors to the Demo project\n//\n// SPDX-License-Identifier: MIT\n\n";

/// The binary run in `dir` with a deterministic environment.
fn spdxstamp(dir: &Path) -> Result<Command> {
  let mut cmd = Command::cargo_bin("spdxstamp")?;
  cmd
    .current_dir(dir)
    .env_remove("SPDXSTAMP_CONFIG")
    .env_remove("SPDXSTAMP_LICENSE_MAP_JSON")
    .env_remove("SPDXSTAMP_LICENSE_MAP_PATH")
    .env_remove("SPDXSTAMP_PROJECT_NAME")
    .env_remove("SPDXSTAMP_FORCE_LICENSE")
    .env_remove("SPDXSTAMP_STRIP_EMAILS")
    .env_remove("GITHUB_REPOSITORY")
    .args(["--colors", "never", "--no-current-user", "--project-name", "Demo"]);
  Ok(cmd)
}

#[test]
fn test_check_mode_exits_one_and_leaves_files() -> Result<()> {
  let temp_dir = TempDir::new()?;
  fs::write(temp_dir.path().join("a.go"), "package a\n")?;

  spdxstamp(temp_dir.path())?
    .args(["--check", "a.go"])
    .assert()
    .code(1)
    .stdout(predicate::str::contains("need header changes"))
    .stdout(predicate::str::contains("a.go"));

  assert_eq!(fs::read_to_string(temp_dir.path().join("a.go"))?, "package a\n");
  Ok(())
}

#[test]
fn test_writes_headers_then_check_passes() -> Result<()> {
  let temp_dir = TempDir::new()?;
  fs::write(temp_dir.path().join("a.go"), "package a\n")?;

  spdxstamp(temp_dir.path())?
    .arg("a.go")
    .assert()
    .success()
    .stdout(predicate::str::contains("Summary: 1 added, 0 updated, 0 unchanged, 0 skipped"));

  assert_eq!(
    fs::read_to_string(temp_dir.path().join("a.go"))?,
    format!("{GENERIC_GO_HEADER}package a\n")
  );

  spdxstamp(temp_dir.path())?
    .args(["--check", "a.go"])
    .assert()
    .success()
    .stdout(predicate::str::contains("All headers are up to date"));
  Ok(())
}

#[test]
fn test_file_lists_are_split_and_deduplicated() -> Result<()> {
  let temp_dir = TempDir::new()?;
  fs::write(temp_dir.path().join("a.go"), "package a\n")?;
  fs::write(temp_dir.path().join("b.py"), "print()\n")?;

  spdxstamp(temp_dir.path())?
    .args(["--files-added", "a.go b.py", "--files-modified", "a.go", "--report-json", "report.json"])
    .assert()
    .success();

  let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(temp_dir.path().join("report.json"))?)?;
  assert_eq!(report["summary"]["total_files"], 2);
  assert_eq!(report["summary"]["headers_added"], 2);
  assert_eq!(report["files"][1]["license"], "MIT");
  Ok(())
}

#[test]
fn test_license_flag_and_csv_report() -> Result<()> {
  let temp_dir = TempDir::new()?;
  fs::write(temp_dir.path().join("a.rs"), "fn main() {}\n")?;

  spdxstamp(temp_dir.path())?
    .args(["--license", "Apache-2.0 OR MIT", "--report-csv", "report.csv", "a.rs"])
    .assert()
    .success();

  assert!(fs::read_to_string(temp_dir.path().join("a.rs"))?.contains("// SPDX-License-Identifier: Apache-2.0 OR MIT\n"));
  let csv = fs::read_to_string(temp_dir.path().join("report.csv"))?;
  assert!(csv.starts_with("path,action,license,authors,error\n"));
  assert!(csv.contains(",added,Apache-2.0 OR MIT,0,"));
  Ok(())
}

#[test]
fn test_missing_file_is_reported_but_not_fatal() -> Result<()> {
  let temp_dir = TempDir::new()?;

  spdxstamp(temp_dir.path())?
    .arg("missing.go")
    .assert()
    .success()
    .stderr(predicate::str::contains("missing.go"));
  Ok(())
}

#[test]
fn test_invalid_config_exits_two() -> Result<()> {
  let temp_dir = TempDir::new()?;
  fs::write(temp_dir.path().join("a.go"), "package a\n")?;
  fs::write(temp_dir.path().join("bad.toml"), "default-license = [not toml")?;

  spdxstamp(temp_dir.path())?
    .args(["--config", "bad.toml", "a.go"])
    .assert()
    .code(2);

  spdxstamp(temp_dir.path())?
    .args(["--config", "bad.toml", "--no-config", "--check", "a.go"])
    .assert()
    .code(1);
  Ok(())
}

#[test]
fn test_config_file_sets_default_license() -> Result<()> {
  let temp_dir = TempDir::new()?;
  fs::write(temp_dir.path().join("a.go"), "package a\n")?;
  fs::write(
    temp_dir.path().join(".spdxstamp.toml"),
    "default-license = \"mpl\"\n\n[comment-styles]\ngo = { prefix = \"#\" }\n",
  )?;

  spdxstamp(temp_dir.path())?.arg("a.go").assert().success();

  let content = fs::read_to_string(temp_dir.path().join("a.go"))?;
  assert!(content.starts_with("# SPDX-FileCopyrightText: Contributors to the Demo project\n"));
  assert!(content.contains("# SPDX-License-Identifier: MPL-2.0\n"));
  Ok(())
}

#[test]
fn test_invalid_argument_exits_two() -> Result<()> {
  let temp_dir = TempDir::new()?;
  spdxstamp(temp_dir.path())?.arg("--no-such-flag").assert().code(2);
  Ok(())
}
