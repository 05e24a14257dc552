//! # Stamp Command
//!
//! This module implements the default command: reconcile the headers of the
//! given files, or check them with `--check`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Args;
use spdxstamp::comment_style::create_resolver;
use spdxstamp::config::{LICENSE_MAP_JSON_ENV_VAR, LICENSE_MAP_PATH_ENV_VAR, Policy, load_config};
use spdxstamp::contributors::IdentityFilter;
use spdxstamp::diff::DiffManager;
use spdxstamp::git::{GitHistory, discover_repo_root};
use spdxstamp::history::{HistorySource, NoHistory, PrRange};
use spdxstamp::info_log;
use spdxstamp::license::LicenseTable;
use spdxstamp::license_map::{LicenseMapSources, load_license_rules};
use spdxstamp::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use spdxstamp::output::{
  CategorizedReports, print_all_files_ok, print_changed_files, print_errors, print_hint, print_start_message,
  print_summary,
};
use spdxstamp::processor::{PrContext, Reconciler, ReconcilerConfig};
use spdxstamp::report::{FileReport, ProcessingSummary, ReportFormat, ReportGenerator};
use tracing::{debug, warn};

/// Arguments for the stamp command
#[derive(Args, Debug, Default)]
pub struct StampArgs {
  /// Files whose headers should be reconciled
  #[arg(required = false)]
  pub files: Vec<String>,

  /// Files added by a change (whitespace-separated lists are split)
  #[arg(long, value_name = "FILES", num_args = 1..)]
  pub files_added: Vec<String>,

  /// Files modified by a change (whitespace-separated lists are split)
  #[arg(long, value_name = "FILES", num_args = 1..)]
  pub files_modified: Vec<String>,

  /// License label or SPDX expression for files without a matching path rule
  #[arg(long, value_name = "EXPR")]
  pub license: Option<String>,

  /// Base commit of the pull request
  #[arg(long, value_name = "REF", requires = "pr_head_sha")]
  pub pr_base_sha: Option<String>,

  /// Head commit of the pull request
  #[arg(long, value_name = "REF", requires = "pr_base_sha")]
  pub pr_head_sha: Option<String>,

  /// GitHub login of the pull request author
  #[arg(long, value_name = "LOGIN")]
  pub pr_author: Option<String>,

  /// JSON file with per-path license rules
  #[arg(long, value_name = "FILE")]
  pub license_map: Option<PathBuf>,

  /// Project name used in the generic attribution line
  #[arg(long, value_name = "NAME")]
  pub project_name: Option<String>,

  /// Replace existing license identifiers with the file's license
  #[arg(long)]
  pub force_license: bool,

  /// Render contributors without their e-mail addresses
  #[arg(long)]
  pub strip_emails: bool,

  /// Do not add the current git user as a contributor
  #[arg(long)]
  pub no_current_user: bool,

  /// Check mode: report files whose headers would change without modifying
  /// them
  #[arg(long)]
  pub check: bool,

  /// Show a diff of each change on stderr
  #[arg(long)]
  pub show_diff: bool,

  /// Save a diff of all changes to a file
  #[arg(long, short = 'o', value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// Generate a JSON report and save it to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Generate a CSV report and save it to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_csv: Option<PathBuf>,

  /// Path to config file (default: .spdxstamp.toml in workspace root)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors and changed file paths
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

impl StampArgs {
  /// Positional files followed by added and modified files, split on
  /// whitespace, without duplicates, in first-seen order.
  pub fn file_list(&self) -> Vec<String> {
    let mut seen = HashSet::new();
    self
      .files
      .iter()
      .chain(&self.files_added)
      .chain(&self.files_modified)
      .flat_map(|value| value.split_whitespace())
      .filter(|file| seen.insert(file.to_string()))
      .map(str::to_string)
      .collect()
  }

  fn pr_context(&self) -> PrContext {
    let range = match (&self.pr_base_sha, &self.pr_head_sha) {
      (Some(base), Some(head)) => Some(PrRange {
        base: base.clone(),
        head: head.clone(),
      }),
      _ => None,
    };
    PrContext {
      range,
      author_login: self.pr_author.as_deref().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string),
    }
  }

  /// Applies the policy flags on top of config and environment.
  fn apply_overrides(&self, policy: &mut Policy) {
    if let Some(license) = self.license.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
      policy.default_license = license.to_string();
    }
    if let Some(name) = self.project_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
      policy.project_name = name.to_string();
    }
    if self.force_license {
      policy.force_license = true;
    }
    if self.strip_emails {
      policy.strip_emails = true;
    }
    if self.no_current_user {
      policy.add_current_user = false;
    }
  }
}

/// The current calendar year in UTC, matching the years read from history.
fn current_year() -> i32 {
  chrono::Utc::now().year()
}

/// Run the stamp command with the given arguments.
///
/// Returns exit status 1 in check mode when any file would change.
pub async fn run_stamp(args: StampArgs) -> Result<ExitCode> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  let cwd = std::env::current_dir().context("Failed to determine current directory")?;
  let workspace_root = match discover_repo_root(&cwd) {
    Ok(Some(root)) => root,
    Ok(None) => cwd.clone(),
    Err(e) => {
      warn!("{:#}; using {} as workspace root", e, cwd.display());
      cwd.clone()
    }
  };
  debug!("Using workspace root: {}", workspace_root.display());

  let config = load_config(args.config.as_deref(), &workspace_root, args.no_config)?;

  let mut policy = Policy::from_sources(config.as_ref(), |key| std::env::var(key).ok(), current_year());
  args.apply_overrides(&mut policy);
  debug!("Policy: {:?}", policy);

  let license_table = config
    .as_ref()
    .map(|c| LicenseTable::with_labels(&c.license_labels))
    .unwrap_or_default();
  let identity_filter = config
    .as_ref()
    .map(|c| IdentityFilter::with_automation_names(&c.automation_names))
    .unwrap_or_default();

  let license_rules = load_license_rules(&LicenseMapSources {
    inline_json: std::env::var(LICENSE_MAP_JSON_ENV_VAR).ok().filter(|v| !v.trim().is_empty()),
    path: license_map_path(&args, config.as_ref().and_then(|c| c.license_map.as_deref()), &workspace_root),
    workspace_root: workspace_root.clone(),
  });
  debug!("Loaded {} license rules", license_rules.len());

  let diff_manager = DiffManager::new(args.show_diff, args.save_diff.clone());
  diff_manager.init()?;

  let history: Box<dyn HistorySource> = match GitHistory::discover(&workspace_root) {
    Ok(history) => Box::new(history),
    Err(e) => {
      info_log!("No git history available; headers will use existing authors only");
      debug!("{:#}", e);
      Box::new(NoHistory)
    }
  };

  let reconciler = Reconciler::new(
    ReconcilerConfig {
      license_table,
      license_rules,
      identity_filter,
      resolver: create_resolver(config.map(Arc::new)),
      check_only: args.check,
      diff_manager: diff_manager.is_enabled().then_some(diff_manager),
      ..ReconcilerConfig::new(workspace_root.clone(), policy)
    },
    history,
  );

  let files: Vec<PathBuf> = args.file_list().iter().map(|file| cwd.join(file)).collect();
  print_start_message(files.len(), args.check);

  let default_expression = reconciler.default_expression();
  let batch = reconciler.process_files(&files, &default_expression, &args.pr_context()).await;

  let reports: Vec<FileReport> = batch.outcomes.iter().map(FileReport::from).collect();
  let summary = ProcessingSummary::from_reports(&reports, batch.elapsed);
  let categorized = CategorizedReports::from_reports(&reports);

  print_errors(&categorized.errors, Some(&workspace_root));
  if categorized.changed.is_empty() {
    if categorized.errors.is_empty() {
      print_all_files_ok();
    }
  } else {
    print_changed_files(&categorized.changed, Some(&workspace_root), args.check);
  }
  print_summary(&summary);

  if args.check && batch.any_changed {
    print_hint("Run without --check to apply these changes.");
  }

  write_report(ReportFormat::Json, args.report_json.as_deref(), &reports, &summary);
  write_report(ReportFormat::Csv, args.report_csv.as_deref(), &reports, &summary);

  if args.check && batch.any_changed {
    return Ok(ExitCode::from(1));
  }
  Ok(ExitCode::SUCCESS)
}

/// The JSON rule file: `--license-map`, then the environment, then the config
/// key (relative to the workspace root).
fn license_map_path(args: &StampArgs, configured: Option<&Path>, workspace_root: &Path) -> Option<PathBuf> {
  if let Some(path) = &args.license_map {
    return Some(path.clone());
  }
  if let Ok(path) = std::env::var(LICENSE_MAP_PATH_ENV_VAR)
    && !path.trim().is_empty()
  {
    return Some(PathBuf::from(path.trim()));
  }
  configured.map(|path| {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      workspace_root.join(path)
    }
  })
}

fn write_report(format: ReportFormat, output_path: Option<&Path>, reports: &[FileReport], summary: &ProcessingSummary) {
  let Some(output_path) = output_path else {
    return;
  };
  let report_generator = ReportGenerator::new(format, output_path);
  if let Err(e) = report_generator.generate(reports, summary) {
    eprintln!("Error generating {} report: {:#}", format, e);
  } else {
    info_log!("Generated {} report at {}", format, output_path.display());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_file_list_splits_and_dedups() {
    let args = StampArgs {
      files: vec!["a.go".to_string()],
      files_added: vec!["b.go  a.go".to_string()],
      files_modified: vec!["c.go\nb.go".to_string()],
      ..StampArgs::default()
    };
    assert_eq!(args.file_list(), vec!["a.go", "b.go", "c.go"]);
  }

  #[test]
  fn test_pr_context() {
    let args = StampArgs {
      pr_base_sha: Some("base".to_string()),
      pr_head_sha: Some("head".to_string()),
      pr_author: Some("  ".to_string()),
      ..StampArgs::default()
    };
    let pr = args.pr_context();
    assert_eq!(
      pr.range,
      Some(PrRange {
        base: "base".to_string(),
        head: "head".to_string()
      })
    );
    assert_eq!(pr.author_login, None);
  }

  #[test]
  fn test_apply_overrides() {
    let args = StampArgs {
      license: Some("apache".to_string()),
      project_name: Some("Widgets".to_string()),
      strip_emails: true,
      no_current_user: true,
      ..StampArgs::default()
    };
    let mut policy = Policy::new(2025);
    args.apply_overrides(&mut policy);
    assert_eq!(policy.default_license, "apache");
    assert_eq!(policy.project_name, "Widgets");
    assert!(policy.strip_emails);
    assert!(!policy.add_current_user);
    assert!(!policy.force_license);
  }

  #[test]
  fn test_current_year_is_utc() {
    let before = chrono::Utc::now().timestamp();
    let year = current_year();
    let after = chrono::Utc::now().timestamp();
    let expected = [before, after].map(spdxstamp::history::utc_year);
    assert!(expected.contains(&Some(year)));
  }

  #[test]
  fn test_license_map_path_relative_to_workspace() {
    let args = StampArgs::default();
    // Only meaningful when the environment does not set a path.
    if std::env::var(LICENSE_MAP_PATH_ENV_VAR).is_err() {
      assert_eq!(
        license_map_path(&args, Some(Path::new("rules.json")), Path::new("/repo")),
        Some(PathBuf::from("/repo/rules.json"))
      );
    }
  }
}
