//! # Git Module
//!
//! This module reads contribution history out of a git repository with
//! `git2`: which commits touched a file, who last edited it, and who the
//! configured user is.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Commit, ErrorCode, Oid, Repository, Sort};

use crate::history::{CommitRecord, HistorySource, PrRange, dedup_commits, format_identity};
use crate::verbose_log;

/// Finds the working directory of the repository containing `start`.
///
/// Returns `Ok(None)` when `start` is not inside a repository or the
/// repository is bare.
pub fn discover_repo_root(start: &Path) -> Result<Option<PathBuf>> {
  match Repository::discover(start) {
    Ok(repo) => Ok(repo.workdir().map(Path::to_path_buf)),
    Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
    Err(e) => Err(e).with_context(|| format!("Failed to open git repository at {}", start.display())),
  }
}

/// [`HistorySource`] backed by a git repository.
pub struct GitHistory {
  repo: Repository,
  workdir: PathBuf,
}

impl GitHistory {
  /// Opens the repository containing `start`.
  pub fn discover(start: &Path) -> Result<Self> {
    let repo =
      Repository::discover(start).with_context(|| format!("Failed to find git repository from {}", start.display()))?;
    Self::from_repository(repo)
  }

  /// Opens the repository whose working directory is `path`.
  pub fn open(path: &Path) -> Result<Self> {
    let repo = Repository::open(path).with_context(|| format!("Failed to open git repository at {}", path.display()))?;
    Self::from_repository(repo)
  }

  fn from_repository(repo: Repository) -> Result<Self> {
    let workdir = repo.workdir().context("Git repository has no working directory")?;
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    Ok(Self { repo, workdir })
  }

  /// The repository's working directory.
  pub fn workdir(&self) -> &Path {
    &self.workdir
  }

  /// `path` relative to the working directory, as git records it.
  fn repo_relative(&self, path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.workdir.join(path)
    };
    let absolute = absolute.canonicalize().unwrap_or(absolute);

    if let Ok(relative) = absolute.strip_prefix(&self.workdir) {
      return Ok(relative.to_path_buf());
    }
    pathdiff::diff_paths(&absolute, &self.workdir)
      .filter(|relative| !relative.starts_with(".."))
      .with_context(|| format!("{} is outside the repository", path.display()))
  }

  /// Whether HEAD points at a commit yet.
  fn has_commits(&self) -> Result<bool> {
    match self.repo.head() {
      Ok(_) => Ok(true),
      Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(false),
      Err(e) => Err(e).context("Failed to read HEAD"),
    }
  }

  fn resolve_commit(&self, spec: &str) -> Result<Oid> {
    let object = self
      .repo
      .revparse_single(spec)
      .with_context(|| format!("Failed to find git reference: {}", spec))?;
    let commit = object
      .peel_to_commit()
      .with_context(|| format!("Failed to get commit for reference: {}", spec))?;
    Ok(commit.id())
  }

  /// Commits reachable from HEAD, or from `range.head` but not `range.base`,
  /// newest first, that touch `relative`.
  fn walk(&self, relative: &Path, range: Option<&PrRange>) -> Result<Vec<CommitRecord>> {
    let mut revwalk = self.repo.revwalk().context("Failed to start revision walk")?;
    revwalk.set_sorting(Sort::TIME).context("Failed to sort revision walk")?;

    match range {
      Some(range) => {
        revwalk.push(self.resolve_commit(&range.head)?)?;
        revwalk.hide(self.resolve_commit(&range.base)?)?;
      }
      None => revwalk.push_head().context("Failed to walk from HEAD")?,
    }

    let mut records = Vec::new();
    for oid in revwalk {
      let commit = self.repo.find_commit(oid?)?;
      if touches(&commit, relative)? {
        records.push(to_record(&commit));
      }
    }
    Ok(records)
  }
}

/// Blob id stored at `path` in `commit`'s tree, if any.
fn blob_at(commit: &Commit<'_>, path: &Path) -> Result<Option<Oid>> {
  let tree = commit.tree()?;
  match tree.get_path(path) {
    Ok(entry) => Ok(Some(entry.id())),
    Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
    Err(e) => Err(e.into()),
  }
}

/// A commit touches `path` when its blob there differs from every parent's.
/// A root commit touches every path it contains.
fn touches(commit: &Commit<'_>, path: &Path) -> Result<bool> {
  let current = blob_at(commit, path)?;
  if commit.parent_count() == 0 {
    return Ok(current.is_some());
  }
  for parent in commit.parents() {
    if blob_at(&parent, path)? == current {
      return Ok(false);
    }
  }
  Ok(true)
}

fn to_record(commit: &Commit<'_>) -> CommitRecord {
  let author = commit.author();
  CommitRecord {
    id: commit.id().to_string(),
    timestamp: author.when().seconds(),
    author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
    author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
    body: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
  }
}

impl HistorySource for GitHistory {
  fn file_history(&self, path: &Path, pr_range: Option<&PrRange>) -> Result<Vec<CommitRecord>> {
    if !self.has_commits()? {
      return Ok(Vec::new());
    }
    let relative = self.repo_relative(path)?;

    let mut commits = match pr_range {
      Some(range) => self.walk(&relative, Some(range))?,
      None => Vec::new(),
    };
    commits.extend(self.walk(&relative, None)?);
    let commits = dedup_commits(commits);

    verbose_log!("Found {} commits touching {}", commits.len(), relative.display());
    Ok(commits)
  }

  fn last_editor(&self, path: &Path) -> Result<Option<String>> {
    if !self.has_commits()? {
      return Ok(None);
    }
    let relative = self.repo_relative(path)?;
    let newest = self.walk(&relative, None)?.into_iter().next();
    Ok(newest.and_then(|c| format_identity(&c.author_name, &c.author_email)))
  }

  fn current_user(&self) -> Option<(String, String)> {
    let config = self.repo.config().ok()?;
    let name = config.get_string("user.name").ok()?;
    let email = config.get_string("user.email").ok()?;
    (!name.trim().is_empty() && !email.trim().is_empty()).then(|| (name.trim().to_string(), email.trim().to_string()))
  }
}
