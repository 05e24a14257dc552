//! # Diff Module
//!
//! Unified diffs of header changes, shown on stderr and/or appended to a
//! file in check mode.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use similar::{ChangeTag, TextDiff};

/// Shows and saves diffs between a file's current and reconciled content.
pub struct DiffManager {
  /// Print diffs to stderr
  pub show_diff: bool,

  /// Append diffs to this file
  pub save_diff_path: Option<PathBuf>,
}

impl DiffManager {
  pub const fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Self {
    Self {
      show_diff,
      save_diff_path,
    }
  }

  /// Whether this manager has anything to do.
  pub const fn is_enabled(&self) -> bool {
    self.show_diff || self.save_diff_path.is_some()
  }

  /// Truncates the save file so a run starts with an empty patch.
  pub fn init(&self) -> Result<()> {
    if let Some(diff_path) = &self.save_diff_path {
      std::fs::write(diff_path, "").with_context(|| format!("Failed to create diff file: {}", diff_path.display()))?;
    }
    Ok(())
  }

  /// Renders a unified diff between `original` and `new` for `path`.
  pub fn render(path: &Path, original: &str, new: &str) -> String {
    let name = path.to_string_lossy();
    TextDiff::from_lines(original, new)
      .unified_diff()
      .context_radius(3)
      .header(&format!("a/{name}"), &format!("b/{name}"))
      .to_string()
  }

  /// Prints the diff to stderr when `show_diff` is set and appends it to
  /// `save_diff_path` when one is configured, so a batch accumulates one
  /// consolidated patch.
  pub fn display_diff(&self, path: &Path, original: &str, new: &str) -> Result<()> {
    if self.show_diff {
      let diff = TextDiff::from_lines(original, new);
      eprintln!("Diff for {}:", path.display());
      for change in diff.iter_all_changes() {
        let line = format!("{}{}", sign(change.tag()), change);
        match change.tag() {
          ChangeTag::Insert => eprint!("{}", line.if_supports_color(Stream::Stderr, |s| s.green())),
          ChangeTag::Delete => eprint!("{}", line.if_supports_color(Stream::Stderr, |s| s.red())),
          ChangeTag::Equal => eprint!("{}", line),
        }
        if change.missing_newline() {
          eprintln!();
        }
      }
      eprintln!();
    }

    if let Some(diff_path) = &self.save_diff_path {
      let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(diff_path)
        .with_context(|| format!("Failed to open diff file: {}", diff_path.display()))?;
      file
        .write_all(Self::render(path, original, new).as_bytes())
        .with_context(|| format!("Failed to write diff file: {}", diff_path.display()))?;
    }

    Ok(())
  }
}

const fn sign(tag: ChangeTag) -> &'static str {
  match tag {
    ChangeTag::Delete => "-",
    ChangeTag::Insert => "+",
    ChangeTag::Equal => " ",
  }
}
