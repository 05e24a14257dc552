//! # History Module
//!
//! The contract between the reconciler and whatever knows a file's
//! contribution history, plus the conversion of raw commits into
//! [`ContributionFact`]s.
//!
//! [`crate::git::GitHistory`] is the git2-backed implementation used by the
//! CLI; tests substitute their own [`HistorySource`].

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use chrono::{DateTime, Datelike};
use regex::Regex;

use crate::contributors::{ContributionFact, IdentityFilter};

static CO_AUTHOR_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?im)^\s*co-authored-by:\s*(.*?)\s*<([^>]+)>").expect("co-author trailer regex must compile")
});

/// A commit that touched a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
  pub id: String,
  /// Author time in seconds since the Unix epoch.
  pub timestamp: i64,
  pub author_name: String,
  pub author_email: String,
  /// Full commit message body; co-author trailers are read from here.
  pub body: String,
}

/// A pull request commit range: commits reachable from `head` but not `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRange {
  pub base: String,
  pub head: String,
}

/// Source of contribution history for files.
///
/// Implementations may block; callers impose any timeout they need.
pub trait HistorySource {
  /// Commits that touched `path`. When `pr_range` is given the commits in
  /// that range are included too, without duplicates.
  fn file_history(&self, path: &Path, pr_range: Option<&PrRange>) -> Result<Vec<CommitRecord>>;

  /// `"Name <email>"` of the author of the newest commit touching `path`.
  fn last_editor(&self, path: &Path) -> Result<Option<String>>;

  /// Name and e-mail of the interactive user, if configured.
  fn current_user(&self) -> Option<(String, String)>;
}

/// A history source with no commits and no user; used when no repository is
/// available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl HistorySource for NoHistory {
  fn file_history(&self, _path: &Path, _pr_range: Option<&PrRange>) -> Result<Vec<CommitRecord>> {
    Ok(Vec::new())
  }

  fn last_editor(&self, _path: &Path) -> Result<Option<String>> {
    Ok(None)
  }

  fn current_user(&self) -> Option<(String, String)> {
    None
  }
}

/// Formats `"Name <email>"`, or `None` when either part is blank.
pub fn format_identity(name: &str, email: &str) -> Option<String> {
  let name = name.trim();
  let email = email.trim();
  if name.is_empty() || email.is_empty() {
    return None;
  }
  Some(format!("{name} <{email}>"))
}

/// `(name, email)` pairs of every `Co-authored-by:` trailer in `body`.
pub fn co_authors(body: &str) -> Vec<(String, String)> {
  CO_AUTHOR_TRAILER
    .captures_iter(body)
    .map(|caps| (caps[1].trim().to_string(), caps[2].trim().to_string()))
    .collect()
}

/// Drops commits whose id was already seen, keeping the first occurrence.
pub fn dedup_commits(commits: Vec<CommitRecord>) -> Vec<CommitRecord> {
  let mut seen = HashSet::new();
  commits.into_iter().filter(|c| seen.insert(c.id.clone())).collect()
}

/// One fact per distinct identity across `commits`.
///
/// Each commit credits its author and every co-author trailer. The fact's
/// years are the UTC calendar years of that identity's earliest and latest
/// commit. Identities rejected by `filter` are dropped. The result is sorted
/// by identity.
pub fn facts_from_commits(commits: &[CommitRecord], filter: &IdentityFilter) -> Vec<ContributionFact> {
  let mut spans: BTreeMap<String, (i64, i64)> = BTreeMap::new();

  let mut credit = |identity: String, timestamp: i64| {
    if !filter.allows(&identity) {
      return;
    }
    spans
      .entry(identity)
      .and_modify(|(lo, hi)| {
        *lo = (*lo).min(timestamp);
        *hi = (*hi).max(timestamp);
      })
      .or_insert((timestamp, timestamp));
  };

  for commit in commits {
    if let Some(identity) = format_identity(&commit.author_name, &commit.author_email) {
      credit(identity, commit.timestamp);
    }
    for (name, email) in co_authors(&commit.body) {
      if let Some(identity) = format_identity(&name, &email) {
        credit(identity, commit.timestamp);
      }
    }
  }

  spans
    .into_iter()
    .filter_map(|(identity, (lo, hi))| Some(ContributionFact::new(identity, utc_year(lo)?, utc_year(hi)?)))
    .collect()
}

/// The UTC calendar year of a Unix timestamp.
pub fn utc_year(timestamp: i64) -> Option<i32> {
  DateTime::from_timestamp(timestamp, 0).map(|dt| dt.year())
}
