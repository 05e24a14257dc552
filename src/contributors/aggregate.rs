//! Merging contribution sources and ordering the result for rendering.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{AuthorSet, ContributionFact, IdentityFilter};

static EMAIL_SUFFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(.+) (<\S+@\S+>)$").expect("e-mail suffix regex must compile"));

/// Merges every contribution source into one author set.
///
/// `existing` holds the authors parsed from the current header and `history`
/// one fact per author found in the file's commits. `current_user` is added
/// with `current_year` when given; callers pass `None` when policy suppresses
/// it. A pull request author login is added as `"<login> (GitHub)"` unless an
/// identity already mentions it. Every source goes through `filter`.
pub fn aggregate(
  existing: &AuthorSet,
  history: &[ContributionFact],
  pr_author_login: Option<&str>,
  current_user: Option<&str>,
  current_year: i32,
  filter: &IdentityFilter,
) -> AuthorSet {
  let mut set: AuthorSet = existing.iter().filter(|f| filter.allows(&f.identity)).cloned().collect();

  for fact in history {
    if filter.allows(&fact.identity) {
      if !set.contains(&fact.identity) {
        debug!("Adding author from history: {}", fact.identity);
      }
      set.insert(fact.clone());
    }
  }

  if let Some(user) = current_user.map(str::trim)
    && filter.allows(user)
  {
    set.insert(ContributionFact::single(user, current_year));
  }

  if let Some(login) = pr_author_login.map(str::trim).filter(|l| !l.is_empty())
    && filter.allows(login)
  {
    let needle = login.to_lowercase();
    let mentioned = set.identities().any(|identity| identity.to_lowercase().contains(&needle));
    if !mentioned {
      debug!("Adding pull request author: {}", login);
      set.insert(ContributionFact::single(format!("{login} (GitHub)"), current_year));
    }
  }

  set
}

/// Drops the ` <email>` part of a `"Name <email>"` identity.
pub fn strip_email(identity: &str) -> String {
  match EMAIL_SUFFIX.captures(identity) {
    Some(caps) => caps[1].trim().to_string(),
    None => identity.to_string(),
  }
}

/// Rekeys every identity without its e-mail; identities that collapse onto
/// the same name are merged.
pub fn strip_emails(set: AuthorSet) -> AuthorSet {
  set
    .into_iter()
    .map(|fact| ContributionFact::new(strip_email(&fact.identity), fact.first_year, fact.last_year))
    .collect()
}

/// Orders authors for rendering.
///
/// Authors are sorted ascending by `(last_year, identity)`. A non-empty
/// `last_editor` is then moved to the end; when it is not in the set it is
/// appended with `fallback_year`.
pub fn order_for_rendering(set: &AuthorSet, last_editor: Option<&str>, fallback_year: i32) -> Vec<ContributionFact> {
  let mut ordered: Vec<ContributionFact> = set.iter().cloned().collect();
  ordered.sort_by(|a, b| (a.last_year, &a.identity).cmp(&(b.last_year, &b.identity)));

  if let Some(editor) = last_editor.filter(|e| !e.trim().is_empty()) {
    ordered.retain(|fact| fact.identity != editor);
    let fact = set
      .get(editor)
      .cloned()
      .unwrap_or_else(|| ContributionFact::single(editor, fallback_year));
    ordered.push(fact);
  }

  ordered
}
