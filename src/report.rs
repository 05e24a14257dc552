//! # Report Module
//!
//! This module provides functionality for writing reports of a
//! reconciliation run in JSON or CSV.
//!
//! It captures each file's final action, license, number of credited authors
//! and any error, together with run totals.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::processor::ReconcileOutcome;

/// Information about a processed file for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
  /// Path to the file
  #[serde(with = "path_serialization")]
  pub path: PathBuf,
  /// What happened to the file
  pub action: FileAction,
  /// License written to the header, if the file was processed
  pub license: Option<String>,
  /// Number of copyright lines in the header
  pub authors: usize,
  /// Why the file was skipped, if it was skipped because of an error
  pub error: Option<String>,
  /// Problems that were worked around
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

impl From<&ReconcileOutcome> for FileReport {
  fn from(outcome: &ReconcileOutcome) -> Self {
    Self {
      path: outcome.path.clone(),
      action: outcome.action(),
      license: outcome.license.clone(),
      authors: outcome.authors,
      error: outcome.error.as_ref().map(ToString::to_string),
      warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
    }
  }
}

/// Possible actions taken on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
  /// A header was added to a file that had none
  Added,
  /// An existing header was rewritten
  Updated,
  /// The header was already correct
  Unchanged,
  /// The file was not processed
  Skipped,
}

impl FileAction {
  pub const fn as_str(self) -> &'static str {
    match self {
      FileAction::Added => "added",
      FileAction::Updated => "updated",
      FileAction::Unchanged => "unchanged",
      FileAction::Skipped => "skipped",
    }
  }
}

/// Helper module for serializing/deserializing PathBuf
mod path_serialization {
  use std::path::PathBuf;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(path: &std::path::Path, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&path.to_string_lossy())
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    Ok(PathBuf::from(s))
  }
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  /// JSON format for machine readability
  Json,
  /// CSV format for spreadsheet compatibility
  Csv,
}

impl std::fmt::Display for ReportFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReportFormat::Json => write!(f, "JSON"),
      ReportFormat::Csv => write!(f, "CSV"),
    }
  }
}

/// Report Generator for writing run reports
pub struct ReportGenerator<'a> {
  format: ReportFormat,
  output_path: &'a Path,
}

#[derive(Serialize)]
struct JsonReport<'a> {
  generated_at: String,
  summary: &'a ProcessingSummary,
  files: &'a [FileReport],
}

impl<'a> ReportGenerator<'a> {
  pub const fn new(format: ReportFormat, output_path: &'a Path) -> Self {
    Self { format, output_path }
  }

  /// Renders the report and writes it to the output path.
  pub fn generate(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<()> {
    let content = self.render(files, summary)?;
    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write {} report to {}", self.format, self.output_path.display()))
  }

  /// Renders the report content.
  pub fn render(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
    match self.format {
      ReportFormat::Json => Self::render_json(files, summary),
      ReportFormat::Csv => Ok(Self::render_csv(files, summary)),
    }
  }

  fn render_json(files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
    let report = JsonReport {
      generated_at: Local::now().to_rfc3339(),
      summary,
      files,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")
  }

  fn render_csv(files: &[FileReport], summary: &ProcessingSummary) -> String {
    let mut csv = String::from("path,action,license,authors,error\n");

    for file in files {
      let row = [
        csv_field(&file.path.to_string_lossy()),
        file.action.as_str().to_string(),
        csv_field(file.license.as_deref().unwrap_or("")),
        file.authors.to_string(),
        csv_field(file.error.as_deref().unwrap_or("")),
      ];
      csv.push_str(&row.join(","));
      csv.push('\n');
    }

    csv.push_str("\n# Summary\n");
    csv.push_str(&format!("Total files,{}\n", summary.total_files));
    csv.push_str(&format!("Headers added,{}\n", summary.headers_added));
    csv.push_str(&format!("Headers updated,{}\n", summary.headers_updated));
    csv.push_str(&format!("Unchanged,{}\n", summary.unchanged));
    csv.push_str(&format!("Skipped,{}\n", summary.skipped));
    csv.push_str(&format!("Errors,{}\n", summary.errors));
    csv.push_str(&format!("Processing time (seconds),{:.2}\n", summary.processing_time_secs));
    csv
  }
}

/// Quotes a CSV field when it contains a separator, quote or newline.
fn csv_field(value: &str) -> String {
  if value.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

/// Totals of a reconciliation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingSummary {
  pub total_files: usize,
  pub headers_added: usize,
  pub headers_updated: usize,
  pub unchanged: usize,
  pub skipped: usize,
  /// Files skipped because of an error
  pub errors: usize,
  pub processing_time_secs: f64,
}

impl ProcessingSummary {
  /// Counts the actions in `files`.
  pub fn from_reports(files: &[FileReport], processing_time: std::time::Duration) -> Self {
    let mut summary = Self {
      total_files: files.len(),
      processing_time_secs: processing_time.as_secs_f64(),
      ..Self::default()
    };

    for file in files {
      match file.action {
        FileAction::Added => summary.headers_added += 1,
        FileAction::Updated => summary.headers_updated += 1,
        FileAction::Unchanged => summary.unchanged += 1,
        FileAction::Skipped => summary.skipped += 1,
      }
      if file.error.is_some() {
        summary.errors += 1;
      }
    }

    summary
  }

  /// Files that were (or in check mode would be) rewritten.
  pub const fn changed(&self) -> usize {
    self.headers_added + self.headers_updated
  }
}
