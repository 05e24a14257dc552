//! # Processor Module
//!
//! This module contains the reconciliation driver: for each file it parses
//! the existing header, gathers contribution data, decides the license,
//! renders a new header and writes the file only when the result differs.
//!
//! The module is organized into several submodules:
//! - [`file_io`] - BOM-aware reads and atomic writes
//! - [`content_transformer`] - Preamble splitting and final content assembly
//!
//! The [`Reconciler`] struct is the main entry point; one file failing never
//! stops the rest of a batch.

mod content_transformer;
mod file_io;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub use content_transformer::{SplitContent, compose, skip_blank_lines, split_preamble};
pub use file_io::{FileContent, FileIO};
use tracing::{debug, warn};

use crate::comment_style::{CommentStyleResolver, create_resolver};
use crate::config::Policy;
use crate::contributors::{AuthorSet, IdentityFilter, aggregate, order_for_rendering, strip_email, strip_emails};
use crate::diff::DiffManager;
use crate::header::{parse, render, strip_existing};
use crate::history::{HistorySource, PrRange, facts_from_commits, format_identity};
use crate::license::{LicenseError, LicenseRule, LicenseTable, matching_rule, normalize_rule_path};
use crate::report::FileAction;
use crate::{info_log, verbose_log};

/// Per-file problems. Some stop the file from being processed, others only
/// degrade the result.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
  /// The file does not exist; it is skipped.
  #[error("File not found: {}", path.display())]
  FileNotFound { path: PathBuf },

  /// History could not be read; the file is processed with no history.
  #[error("History unavailable for {}: {message}", path.display())]
  HistoryUnavailable { path: PathBuf, message: String },

  /// Header lines without a license line; the file is treated as having no
  /// header.
  #[error("Malformed existing header in {}; treating the file as unheadered", path.display())]
  MalformedExistingHeader { path: PathBuf },

  /// The file could not be read or is not UTF-8; it is skipped.
  #[error("Failed to read {}: {message}", path.display())]
  ReadFailure { path: PathBuf, message: String },

  /// The new content could not be written; the file is left as it was.
  #[error("Failed to write {}: {message}", path.display())]
  WriteFailure { path: PathBuf, message: String },

  /// A license rule could not be resolved; the default license is used.
  #[error("Unresolvable license for {}: {source}", path.display())]
  LicenseExpressionUnresolvable { path: PathBuf, source: LicenseError },
}

/// Final state of a file after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStatus {
  /// Unsupported, missing or unreadable/unwritable.
  Skipped,
  /// The file already had the correct header.
  Unchanged,
  /// The file was rewritten (or would be, in check mode).
  Modified,
}

/// Result of reconciling one file.
#[derive(Debug)]
pub struct ReconcileOutcome {
  pub path: PathBuf,
  pub status: ReconcileStatus,
  /// `true` when the file had no header before.
  pub new_header: bool,
  /// License written to the header.
  pub license: Option<String>,
  /// Number of copyright lines written.
  pub authors: usize,
  /// The problem that made the file be skipped.
  pub error: Option<ReconcileError>,
  /// Problems that were worked around.
  pub warnings: Vec<ReconcileError>,
}

impl ReconcileOutcome {
  fn skipped(path: &Path, error: Option<ReconcileError>) -> Self {
    Self {
      path: path.to_path_buf(),
      status: ReconcileStatus::Skipped,
      new_header: false,
      license: None,
      authors: 0,
      error,
      warnings: Vec::new(),
    }
  }

  /// The report action for this outcome.
  pub const fn action(&self) -> FileAction {
    match self.status {
      ReconcileStatus::Skipped => FileAction::Skipped,
      ReconcileStatus::Unchanged => FileAction::Unchanged,
      ReconcileStatus::Modified if self.new_header => FileAction::Added,
      ReconcileStatus::Modified => FileAction::Updated,
    }
  }
}

/// Pull request context for a run.
#[derive(Debug, Clone, Default)]
pub struct PrContext {
  /// Commits of the pull request, included in every file's history.
  pub range: Option<PrRange>,
  /// GitHub login of the pull request author.
  pub author_login: Option<String>,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
  pub outcomes: Vec<ReconcileOutcome>,
  /// Whether any file was (or in check mode would be) modified.
  pub any_changed: bool,
  /// Messages of the errors that made files be skipped.
  pub errors: Vec<String>,
  pub elapsed: Duration,
}

/// Configuration for creating a Reconciler instance.
pub struct ReconcilerConfig {
  /// Relative file paths and license rule matching are based here.
  pub workspace_root: PathBuf,
  pub policy: Policy,
  pub license_table: LicenseTable,
  pub license_rules: Vec<LicenseRule>,
  pub identity_filter: IdentityFilter,
  pub resolver: Box<dyn CommentStyleResolver>,

  /// Compute changes without writing them.
  pub check_only: bool,
  pub diff_manager: Option<DiffManager>,
}

impl ReconcilerConfig {
  /// Creates a ReconcilerConfig with builtin tables and no license rules.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// ReconcilerConfig {
  ///     check_only: true,
  ///     ..ReconcilerConfig::new(workspace_root, policy)
  /// }
  /// ```
  pub fn new(workspace_root: PathBuf, policy: Policy) -> Self {
    Self {
      workspace_root,
      policy,
      license_table: LicenseTable::default(),
      license_rules: Vec::new(),
      identity_filter: IdentityFilter::default(),
      resolver: create_resolver(None),
      check_only: false,
      diff_manager: None,
    }
  }
}

/// Keeps SPDX headers in sync with contribution history and license policy.
pub struct Reconciler {
  workspace_root: PathBuf,
  policy: Policy,
  license_table: LicenseTable,
  license_rules: Vec<LicenseRule>,
  identity_filter: IdentityFilter,
  resolver: Box<dyn CommentStyleResolver>,
  check_only: bool,
  diff_manager: Option<DiffManager>,
  history: Box<dyn HistorySource>,
}

impl Reconciler {
  pub fn new(config: ReconcilerConfig, history: Box<dyn HistorySource>) -> Self {
    Self {
      workspace_root: config.workspace_root,
      policy: config.policy,
      license_table: config.license_table,
      license_rules: config.license_rules,
      identity_filter: config.identity_filter,
      resolver: config.resolver,
      check_only: config.check_only,
      diff_manager: config.diff_manager,
      history,
    }
  }

  pub fn policy(&self) -> &Policy {
    &self.policy
  }

  /// Resolves the run's default license label or expression.
  pub fn default_expression(&self) -> String {
    let default = &self.policy.default_license;
    self.license_table.resolve_or_default(default, crate::license::DEFAULT_LICENSE_LABEL)
  }

  fn absolute(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.workspace_root.join(path)
    }
  }

  /// The path rules are matched against: relative to the workspace root with
  /// `/` separators.
  fn rule_path(&self, path: &Path) -> String {
    let absolute = self.absolute(path);
    let relative = pathdiff::diff_paths(&absolute, &self.workspace_root).unwrap_or(absolute);
    normalize_rule_path(&relative.to_string_lossy())
  }

  /// The license expression for `path`: the most specific matching rule, or
  /// `default_expression` when none matches or the rule can't be resolved.
  pub fn license_for_path(&self, path: &Path, default_expression: &str) -> (String, Option<ReconcileError>) {
    let rule_path = self.rule_path(path);
    let Some(rule) = matching_rule(&rule_path, &self.license_rules) else {
      return (default_expression.to_string(), None);
    };

    debug!("License rule '{}' applies to {}", rule.pattern(), rule_path);
    match self.license_table.resolve(rule.license(), &self.policy.default_license) {
      Ok(expression) => (expression, None),
      Err(source) => {
        let error = ReconcileError::LicenseExpressionUnresolvable {
          path: path.to_path_buf(),
          source,
        };
        warn!("{error}; using {default_expression}");
        (default_expression.to_string(), Some(error))
      }
    }
  }

  /// Reconciles one file's header with `license_expression` as the license
  /// for a new header (or for every header when the policy forces it).
  pub async fn reconcile_file(&self, path: &Path, license_expression: &str, pr: &PrContext) -> ReconcileOutcome {
    let Some(style) = self.resolver.resolve(path) else {
      verbose_log!("Skipping unsupported file type: {}", path.display());
      return ReconcileOutcome::skipped(path, None);
    };

    let full_path = self.absolute(path);
    let is_file = tokio::fs::metadata(&full_path).await.is_ok_and(|m| m.is_file());
    if !is_file {
      let error = ReconcileError::FileNotFound {
        path: path.to_path_buf(),
      };
      warn!("{error}");
      return ReconcileOutcome::skipped(path, Some(error));
    }

    let content = match FileIO::read(&full_path).await {
      Ok(content) => content,
      Err(e) => {
        let error = ReconcileError::ReadFailure {
          path: path.to_path_buf(),
          message: format!("{e:#}"),
        };
        warn!("{error}");
        return ReconcileOutcome::skipped(path, Some(error));
      }
    };

    let mut warnings = Vec::new();
    let split = split_preamble(&content.text, &style);
    let parsed = parse(split.body, &style);
    if parsed.is_malformed() {
      let warning = ReconcileError::MalformedExistingHeader {
        path: path.to_path_buf(),
      };
      warn!("{warning}");
      warnings.push(warning);
    }

    let commits = match self.history.file_history(&full_path, pr.range.as_ref()) {
      Ok(commits) => commits,
      Err(e) => {
        let warning = ReconcileError::HistoryUnavailable {
          path: path.to_path_buf(),
          message: format!("{e:#}"),
        };
        warn!("{warning}");
        warnings.push(warning);
        Vec::new()
      }
    };
    let history = facts_from_commits(&commits, &self.identity_filter);

    let year = self.policy.current_year;
    let current_user = if self.policy.add_current_user {
      self
        .history
        .current_user()
        .and_then(|(name, email)| format_identity(&name, &email))
    } else {
      None
    };

    let last_editor = match self.history.last_editor(&full_path) {
      Ok(editor) => editor.filter(|identity| self.identity_filter.allows(identity)),
      Err(e) => {
        debug!("No last editor for {}: {:#}", path.display(), e);
        None
      }
    };
    let last_editor_year = last_editor
      .as_deref()
      .and_then(|editor| history.iter().find(|f| f.identity == editor))
      .map_or(year, |fact| fact.last_year);

    let existing = if parsed.license_expression.is_some() {
      parsed.author_set()
    } else {
      AuthorSet::new()
    };
    let mut authors = aggregate(
      &existing,
      &history,
      pr.author_login.as_deref(),
      current_user.as_deref(),
      year,
      &self.identity_filter,
    );

    let mut last_editor = last_editor;
    if self.policy.strip_emails {
      authors = strip_emails(authors);
      last_editor = last_editor.map(|editor| strip_email(&editor));
    }

    let ordered = order_for_rendering(&authors, last_editor.as_deref(), last_editor_year);

    let (license, new_header) = match &parsed.license_expression {
      Some(existing) if !self.policy.force_license => (existing.clone(), false),
      Some(_) => (license_expression.to_string(), false),
      None => (license_expression.to_string(), true),
    };

    let header = render(&ordered, &license, &style, &self.policy.project_name);
    let (body, _) = strip_existing(split.body, &style);
    // A declaration may sit below the header remnants that were just removed.
    let (preamble, body) = match split.preamble {
      None if new_header => {
        let resplit = split_preamble(body, &style);
        (resplit.preamble, resplit.body)
      }
      preamble => (preamble, body),
    };
    let new_content = compose(preamble, &header, body);

    let mut outcome = ReconcileOutcome {
      path: path.to_path_buf(),
      status: ReconcileStatus::Unchanged,
      new_header,
      license: Some(license),
      authors: ordered.len(),
      error: None,
      warnings,
    };

    if new_content.as_bytes() == content.raw.as_slice() {
      verbose_log!("No changes needed for {}", path.display());
      return outcome;
    }

    if let Some(diff_manager) = &self.diff_manager
      && let Err(e) = diff_manager.display_diff(path, &content.text, &new_content)
    {
      warn!("Failed to display diff for {}: {:#}", path.display(), e);
    }

    if !self.check_only
      && let Err(e) = FileIO::write_atomic(&full_path, &new_content).await
    {
      let error = ReconcileError::WriteFailure {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
      };
      warn!("{error}");
      outcome.status = ReconcileStatus::Skipped;
      outcome.error = Some(error);
      return outcome;
    }

    outcome.status = ReconcileStatus::Modified;
    if !self.check_only {
      if new_header {
        info_log!("Added header to: {}", path.display());
      } else {
        info_log!("Updated header in: {}", path.display());
      }
    }
    outcome
  }

  /// Reconciles `paths` one after another.
  ///
  /// Each file's license is the most specific matching rule or
  /// `default_expression`.
  pub async fn process_files(&self, paths: &[PathBuf], default_expression: &str, pr: &PrContext) -> BatchSummary {
    let start = Instant::now();
    let mut summary = BatchSummary::default();

    for path in paths {
      verbose_log!("Processing: {}", path.display());
      let (license, license_warning) = self.license_for_path(path, default_expression);
      let mut outcome = self.reconcile_file(path, &license, pr).await;
      outcome.warnings.extend(license_warning);

      if outcome.status == ReconcileStatus::Modified {
        summary.any_changed = true;
      }
      if let Some(error) = &outcome.error {
        summary.errors.push(error.to_string());
      }
      summary.outcomes.push(outcome);
    }

    summary.elapsed = start.elapsed();
    debug!(
      "Reconciled {} files in {}ms",
      summary.outcomes.len(),
      summary.elapsed.as_millis()
    );
    summary
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_action_for_outcome() {
    let mut outcome = ReconcileOutcome::skipped(Path::new("a.go"), None);
    assert_eq!(outcome.action(), FileAction::Skipped);

    outcome.status = ReconcileStatus::Modified;
    outcome.new_header = true;
    assert_eq!(outcome.action(), FileAction::Added);

    outcome.new_header = false;
    assert_eq!(outcome.action(), FileAction::Updated);

    outcome.status = ReconcileStatus::Unchanged;
    assert_eq!(outcome.action(), FileAction::Unchanged);
  }

  #[test]
  fn test_rule_path_is_workspace_relative() {
    let root = PathBuf::from("/repo");
    let reconciler = Reconciler::new(
      ReconcilerConfig::new(root.clone(), Policy::new(2025)),
      Box::new(crate::history::NoHistory),
    );
    assert_eq!(reconciler.rule_path(Path::new("src/a.go")), "src/a.go");
    assert_eq!(reconciler.rule_path(&root.join("src/b.go")), "src/b.go");
  }

  #[test]
  fn test_license_for_path_reports_unresolvable_rule() {
    let config = ReconcilerConfig {
      license_rules: vec![
        LicenseRule::new("vendor/**", "mpl").expect("valid"),
        LicenseRule::new("weird/**", "not a license!").expect("valid"),
      ],
      ..ReconcilerConfig::new(PathBuf::from("/repo"), Policy::new(2025))
    };
    let reconciler = Reconciler::new(config, Box::new(crate::history::NoHistory));

    assert_eq!(reconciler.license_for_path(Path::new("vendor/x.go"), "MIT").0, "MPL-2.0");
    assert_eq!(reconciler.license_for_path(Path::new("src/x.go"), "MIT").0, "MIT");

    let (license, warning) = reconciler.license_for_path(Path::new("weird/x.go"), "MIT");
    assert_eq!(license, "MIT");
    assert!(matches!(
      warning,
      Some(ReconcileError::LicenseExpressionUnresolvable { .. })
    ));
  }
}
