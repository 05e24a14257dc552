//! Identity filtering.
//!
//! An [`IdentityFilter`] is an ordered list of [`IdentityRule`]s; an identity
//! is rejected as soon as one rule matches it. Name rules look at the name
//! part of `"Name <email>"` identities, lowercased. Token rules look at the
//! whole identity.

/// Prefixes of GitHub credential tokens.
pub const TOKEN_PREFIXES: [&str; 5] = ["github_pat_", "ghp_", "gho_", "ghs_", "ghu_"];

/// A single reason to reject an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRule {
  /// The identity is empty or whitespace.
  Empty,
  /// The name is `Unknown`, in any case.
  Unknown,
  /// The name ends with the given suffix.
  NameSuffix(String),
  /// The name starts with the given prefix.
  NamePrefix(String),
  /// The name equals the given string.
  NameEquals(String),
  /// The name contains the given substring.
  NameContains(String),
  /// The identity contains a credential-like token.
  Token(String),
}

impl IdentityRule {
  /// Returns `true` when this rule rejects `identity`.
  pub fn rejects(&self, identity: &str) -> bool {
    let name = name_part(identity).to_lowercase();
    match self {
      IdentityRule::Empty => identity.trim().is_empty(),
      IdentityRule::Unknown => name == "unknown",
      IdentityRule::NameSuffix(suffix) => name.ends_with(suffix.as_str()),
      IdentityRule::NamePrefix(prefix) => name.starts_with(prefix.as_str()),
      IdentityRule::NameEquals(value) => name == *value,
      IdentityRule::NameContains(needle) => name.contains(needle.as_str()),
      IdentityRule::Token(token) => identity.contains(token.as_str()),
    }
  }
}

/// Predicate deciding whether an identity is a human contributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityFilter {
  rules: Vec<IdentityRule>,
}

impl Default for IdentityFilter {
  fn default() -> Self {
    let mut rules = vec![
      IdentityRule::Empty,
      IdentityRule::Unknown,
      IdentityRule::NameSuffix("[bot]".to_string()),
      IdentityRule::NameSuffix("-bot".to_string()),
      IdentityRule::NameContains(" bot".to_string()),
      IdentityRule::NamePrefix("bot ".to_string()),
      IdentityRule::NameEquals("bot".to_string()),
      IdentityRule::NameContains("github-actions".to_string()),
      IdentityRule::NameContains("dependabot".to_string()),
    ];
    rules.extend(TOKEN_PREFIXES.iter().map(|t| IdentityRule::Token((*t).to_string())));
    Self { rules }
  }
}

impl IdentityFilter {
  /// The builtin rules plus a name-substring rule per automation account name.
  pub fn with_automation_names(names: &[String]) -> Self {
    let mut filter = Self::default();
    filter.rules.extend(
      names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .map(IdentityRule::NameContains),
    );
    filter
  }

  pub fn rules(&self) -> &[IdentityRule] {
    &self.rules
  }

  /// The first rule that rejects `identity`, if any.
  pub fn rejection(&self, identity: &str) -> Option<&IdentityRule> {
    self.rules.iter().find(|rule| rule.rejects(identity))
  }

  /// Returns `true` when no rule rejects `identity`.
  pub fn allows(&self, identity: &str) -> bool {
    self.rejection(identity).is_none()
  }
}

/// The name of a `"Name <email>"` identity, or the whole identity when it has
/// no e-mail part.
pub fn name_part(identity: &str) -> &str {
  let trimmed = identity.trim();
  if trimmed.ends_with('>')
    && let Some(open) = trimmed.rfind('<')
  {
    return trimmed[..open].trim();
  }
  trimmed
}
