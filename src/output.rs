//! # Output Module
//!
//! This module centralizes the user-facing run summary for spdxstamp.
//! Per-file progress goes through the logging macros; this module prints
//! the lists and totals shown once a batch is done.
//!
//! Quiet mode prints only the paths of files that changed (or would change),
//! one per line, so the output can be piped.

use std::path::Path;

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::report::{FileAction, FileReport, ProcessingSummary};

/// Symbols used in output
pub mod symbols {
  /// Header correct
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Error
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Header added or rewritten
  pub const UPDATED: &str = "\u{21bb}"; // ↻
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Print "Checking N files..." or "Processing N files...".
pub fn print_start_message(file_count: usize, check_mode: bool) {
  if is_quiet() {
    return;
  }

  let verb = if check_mode { "Checking" } else { "Processing" };
  println!("{} {} {}...", verb, file_count, plural(file_count));
}

/// Print the files whose headers were (or would be) added or rewritten.
///
/// Shows up to `DEFAULT_FILE_LIST_LIMIT` files unless verbose.
pub fn print_changed_files(files: &[&FileReport], workspace_root: Option<&Path>, check_mode: bool) {
  if files.is_empty() {
    return;
  }

  let mut sorted: Vec<_> = files.to_vec();
  sorted.sort_by(|a, b| a.path.cmp(&b.path));

  if is_quiet() {
    for file in &sorted {
      println!("{}", make_relative_path(&file.path, workspace_root));
    }
    return;
  }

  let count = sorted.len();
  let title = if check_mode {
    format!("{} {} need header changes:", count, plural(count))
  } else {
    format!("{} {} updated:", count, plural(count))
  };
  println!(
    "{} {}",
    symbols::UPDATED.if_supports_color(Stream::Stdout, |s| s.yellow()),
    title
  );

  let limit = if is_verbose() { count } else { DEFAULT_FILE_LIST_LIMIT };
  for file in sorted.iter().take(limit) {
    let verb = match file.action {
      FileAction::Added => "add",
      _ => "update",
    };
    println!(
      "  {} {}",
      make_relative_path(&file.path, workspace_root),
      format!("({verb})").if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }

  if count > limit {
    println!("  ... and {} more (use -v to see all)", count - limit);
  }
}

/// Print files that were skipped because of an error. Errors are shown even
/// in quiet mode, on stderr.
pub fn print_errors(files: &[&FileReport], workspace_root: Option<&Path>) {
  for file in files {
    if let Some(error) = &file.error {
      eprintln!(
        "{} {}: {}",
        symbols::FAILURE.if_supports_color(Stream::Stderr, |s| s.red()),
        make_relative_path(&file.path, workspace_root),
        error
      );
    }
  }
}

/// Print the processing summary.
///
/// Format: "Summary: X added, Y updated, Z unchanged, W skipped"
/// In verbose mode, also shows timing.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }

  let mut line = format!(
    "Summary: {} added, {} updated, {} unchanged, {} skipped",
    summary.headers_added.if_supports_color(Stream::Stdout, |s| s.cyan()),
    summary.headers_updated.if_supports_color(Stream::Stdout, |s| s.cyan()),
    summary.unchanged.if_supports_color(Stream::Stdout, |s| s.cyan()),
    summary.skipped.if_supports_color(Stream::Stdout, |s| s.dimmed())
  );

  if summary.errors > 0 {
    line.push_str(&format!(
      ", {} {}",
      summary.errors.if_supports_color(Stream::Stdout, |s| s.red()),
      if summary.errors == 1 { "error" } else { "errors" }
    ));
  }

  if is_verbose() {
    line.push_str(&format!(" ({:.2}s)", summary.processing_time_secs));
  }

  println!("{}", line);
}

/// Print the closing line when nothing needs to change.
pub fn print_all_files_ok() {
  if is_quiet() {
    return;
  }
  println!(
    "{} All headers are up to date",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())
  );
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }
  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

/// File reports grouped for output.
pub struct CategorizedReports<'a> {
  /// Added or rewritten headers
  pub changed: Vec<&'a FileReport>,
  /// Headers that were already correct
  pub unchanged: Vec<&'a FileReport>,
  /// Files skipped because of an error
  pub errors: Vec<&'a FileReport>,
  /// Files skipped without an error (unsupported type)
  pub unsupported: Vec<&'a FileReport>,
}

impl<'a> CategorizedReports<'a> {
  pub fn from_reports(reports: &'a [FileReport]) -> Self {
    let mut categorized = Self {
      changed: Vec::new(),
      unchanged: Vec::new(),
      errors: Vec::new(),
      unsupported: Vec::new(),
    };

    for report in reports {
      match report.action {
        FileAction::Added | FileAction::Updated => categorized.changed.push(report),
        FileAction::Unchanged => categorized.unchanged.push(report),
        FileAction::Skipped if report.error.is_some() => categorized.errors.push(report),
        FileAction::Skipped => categorized.unsupported.push(report),
      }
    }

    categorized
  }
}

const fn plural(count: usize) -> &'static str {
  if count == 1 { "file" } else { "files" }
}

/// Make a path relative to the workspace root for display.
fn make_relative_path(path: &Path, workspace_root: Option<&Path>) -> String {
  match workspace_root.and_then(|root| path.strip_prefix(root).ok()) {
    Some(relative) => relative.to_string_lossy().to_string(),
    None => path.to_string_lossy().to_string(),
  }
}
