#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

/// Checks if git is available on the system.
pub fn is_git_available() -> bool {
  Command::new("git").arg("--version").status().is_ok()
}

/// Runs a git command in the given directory with extra environment
/// variables, returning stdout or an error with stderr on failure.
pub fn run_git_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<String> {
  let output = Command::new("git")
    .args(args)
    .envs(env.iter().copied())
    .current_dir(dir)
    .output()
    .with_context(|| format!("Failed to execute git {:?}", args))?;

  if !output.status.success() {
    anyhow::bail!("git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
  }
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Runs a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
  run_git_with_env(dir, args, &[])
}

/// Initializes a git repository in the given directory with deterministic
/// settings.
///
/// Configures:
/// - Default branch name set to `main`
/// - User name and email for commits
/// - Disables commit signing for test isolation
pub fn init_git_repo(dir: &Path) -> Result<()> {
  run_git(dir, &["init"])?;
  run_git(dir, &["config", "init.defaultBranch", "main"])?;
  run_git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
  run_git(dir, &["config", "user.name", "Test User"])?;
  run_git(dir, &["config", "user.email", "test@example.com"])?;
  run_git(dir, &["config", "commit.gpgsign", "false"])?;
  Ok(())
}

/// Writes `content` to `file`, stages it and commits it as `author`
/// (`"Name <email>"`) at `date` (RFC 3339). Returns the new commit id.
pub fn commit_file_as(dir: &Path, file: &str, content: &str, author: &str, date: &str, message: &str) -> Result<String> {
  let path = dir.join(file);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(&path, content)?;
  run_git(dir, &["add", file])?;
  run_git_with_env(
    dir,
    &["commit", "-m", message, "--author", author],
    &[("GIT_AUTHOR_DATE", date), ("GIT_COMMITTER_DATE", date)],
  )?;
  run_git(dir, &["rev-parse", "HEAD"])
}
