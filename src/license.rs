//! # License Module
//!
//! Turns license labels and expressions into canonical SPDX license
//! expressions, and picks the expression that applies to a given path from a
//! list of glob rules.
//!
//! Labels are short aliases such as `mit` or `agpl`. Expressions join several
//! labels or SPDX ids with `,`, `;`, `&`, `+`, `OR` or `AND`:
//!
//! ```rust
//! use spdxstamp::license::{DEFAULT_LICENSE_LABEL, LicenseTable};
//!
//! let table = LicenseTable::default();
//! let expression = table.resolve("mit,agpl", DEFAULT_LICENSE_LABEL).unwrap();
//! assert_eq!(expression, "MIT OR AGPL-3.0-or-later");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use glob::{MatchOptions, Pattern};
use regex::Regex;
use tracing::warn;

/// Label used when neither the caller nor the configuration names a license.
pub const DEFAULT_LICENSE_LABEL: &str = "mit";

const BUILTIN_LABELS: [(&str, &str); 3] = [("mit", "MIT"), ("agpl", "AGPL-3.0-or-later"), ("mpl", "MPL-2.0")];

static AND_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bAND\b").expect("AND regex must compile"));

static OR_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bOR\b").expect("OR regex must compile"));

static TOKEN_SPLIT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\s+(?:OR|AND)\s+|[,;&+]+").expect("token split regex must compile"));

static SPDX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z0-9.\-:]+(?:\s+(?i:WITH)\s+[A-Za-z0-9.\-:]+)?$").expect("SPDX token regex must compile")
});

/// Error type for license resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LicenseError {
  /// A token is neither a known label nor shaped like an SPDX identifier.
  #[error("License token '{token}' in '{expression}' is not a known label or SPDX identifier")]
  Unresolvable { token: String, expression: String },
}

/// Label to SPDX id lookup table.
///
/// Starts with the builtin `mit`, `agpl` and `mpl` labels and can be extended
/// from configuration.
#[derive(Debug, Clone)]
pub struct LicenseTable {
  /// Lowercase label to canonical SPDX id.
  labels: HashMap<String, String>,
}

impl Default for LicenseTable {
  fn default() -> Self {
    let labels = BUILTIN_LABELS
      .iter()
      .map(|(label, id)| ((*label).to_string(), (*id).to_string()))
      .collect();
    Self { labels }
  }
}

impl LicenseTable {
  /// Builtin labels extended (or overridden) by `extra` entries.
  pub fn with_labels(extra: &HashMap<String, String>) -> Self {
    let mut table = Self::default();
    for (label, id) in extra {
      let label = label.trim().to_lowercase();
      let id = id.trim();
      if !label.is_empty() && !id.is_empty() {
        table.labels.insert(label, id.to_string());
      }
    }
    table
  }

  /// Resolves a label, SPDX id or combined expression into a canonical SPDX
  /// expression.
  ///
  /// An empty expression resolves `default_label`. The tokens are joined with
  /// ` AND ` when the expression contains the word `AND` but not `OR`, and with
  /// ` OR ` otherwise.
  pub fn resolve(&self, expression: &str, default_label: &str) -> Result<String, LicenseError> {
    let mut original = expression.trim();
    if original.is_empty() {
      original = default_label.trim();
    }
    if original.is_empty() {
      original = DEFAULT_LICENSE_LABEL;
    }

    if original.contains(['(', ')']) {
      return self.resolve_grouped(original);
    }

    let joiner = if AND_WORD.is_match(original) && !OR_WORD.is_match(original) {
      " AND "
    } else {
      " OR "
    };

    let mut ids = Vec::new();
    for token in TOKEN_SPLIT.split(original).map(str::trim).filter(|t| !t.is_empty()) {
      ids.push(self.resolve_token(token, original)?);
    }

    if ids.is_empty() {
      return Ok(self.default_id());
    }

    Ok(ids.join(joiner))
  }

  /// Resolves `expression`, falling back to the resolved `default_label` when
  /// the expression is unresolvable.
  pub fn resolve_or_default(&self, expression: &str, default_label: &str) -> String {
    match self.resolve(expression, default_label) {
      Ok(resolved) => resolved,
      Err(e) => {
        warn!("{e}; using the default license instead");
        self
          .resolve(default_label, DEFAULT_LICENSE_LABEL)
          .unwrap_or_else(|_| self.default_id())
      }
    }
  }

  /// Resolves a parenthesized SPDX expression word by word, keeping its
  /// operators and grouping as written.
  fn resolve_grouped(&self, expression: &str) -> Result<String, LicenseError> {
    let unresolvable = |token: &str| LicenseError::Unresolvable {
      token: token.to_string(),
      expression: expression.to_string(),
    };

    let spaced = expression.replace('(', " ( ").replace(')', " ) ");
    let mut depth = 0usize;
    let mut resolved = String::new();
    for word in spaced.split_whitespace() {
      let piece = match word.to_uppercase().as_str() {
        "(" => {
          depth += 1;
          word.to_string()
        }
        ")" => {
          depth = depth.checked_sub(1).ok_or_else(|| unresolvable(word))?;
          word.to_string()
        }
        op @ ("AND" | "OR" | "WITH") => op.to_string(),
        _ => self.resolve_token(word, expression)?,
      };
      if !(resolved.is_empty() || resolved.ends_with('(') || piece == ")") {
        resolved.push(' ');
      }
      resolved.push_str(&piece);
    }

    if depth != 0 {
      return Err(unresolvable("("));
    }
    if resolved.is_empty() {
      return Ok(self.default_id());
    }
    Ok(resolved)
  }

  fn resolve_token(&self, token: &str, expression: &str) -> Result<String, LicenseError> {
    let key = token.to_lowercase();

    if let Some(id) = self.labels.get(&key) {
      return Ok(id.clone());
    }

    if let Some(id) = self.labels.values().find(|id| id.to_lowercase() == key) {
      return Ok(id.clone());
    }

    if SPDX_TOKEN.is_match(token) {
      return Ok(token.to_string());
    }

    Err(LicenseError::Unresolvable {
      token: token.to_string(),
      expression: expression.to_string(),
    })
  }

  fn default_id(&self) -> String {
    self
      .labels
      .get(DEFAULT_LICENSE_LABEL)
      .cloned()
      .unwrap_or_else(|| "MIT".to_string())
  }
}

/// A path glob and the license label or expression it assigns.
#[derive(Debug, Clone)]
pub struct LicenseRule {
  pattern: Pattern,
  source: String,
  license: String,
}

impl LicenseRule {
  /// Compiles a rule. Returns `None` for an empty license or an invalid glob.
  pub fn new(pattern: &str, license: &str) -> Option<Self> {
    let source = pattern.trim().replace('\\', "/");
    let license = license.trim();
    if source.is_empty() || license.is_empty() {
      return None;
    }

    match Pattern::new(&source) {
      Ok(compiled) => Some(Self {
        pattern: compiled,
        source,
        license: license.to_string(),
      }),
      Err(e) => {
        warn!("Skipping invalid license rule pattern '{}': {}", source, e);
        None
      }
    }
  }

  /// The pattern as it was written.
  pub fn pattern(&self) -> &str {
    &self.source
  }

  /// The license label or expression assigned by this rule.
  pub fn license(&self) -> &str {
    &self.license
  }

  fn matches(&self, normalized_path: &str) -> bool {
    const OPTIONS: MatchOptions = MatchOptions {
      case_sensitive: true,
      require_literal_separator: false,
      require_literal_leading_dot: false,
    };
    self.pattern.matches_with(normalized_path, OPTIONS)
  }
}

/// Normalizes separators to `/` and strips leading `./` and `/` segments.
pub fn normalize_rule_path(path: &str) -> String {
  let mut normalized = path.replace('\\', "/");
  loop {
    if let Some(rest) = normalized.strip_prefix("./") {
      normalized = rest.to_string();
    } else if let Some(rest) = normalized.strip_prefix('/') {
      normalized = rest.to_string();
    } else {
      break;
    }
  }
  normalized
}

/// Picks the license expression for `path`.
///
/// Every rule whose glob matches the normalized path is a candidate; the
/// longest pattern wins and ties go to the rule declared first. The winning
/// label is resolved through `table`. Without a match `default_expression` is
/// returned as is.
pub fn resolve_for_path(path: &str, default_expression: &str, rules: &[LicenseRule], table: &LicenseTable) -> String {
  match matching_rule(path, rules) {
    Some(rule) => table.resolve_or_default(&rule.license, default_expression),
    None => default_expression.to_string(),
  }
}

/// The most specific rule matching `path`: the longest pattern, ties going to
/// the rule declared first.
pub fn matching_rule<'a>(path: &str, rules: &'a [LicenseRule]) -> Option<&'a LicenseRule> {
  let normalized = normalize_rule_path(path);

  let mut best: Option<&LicenseRule> = None;
  for rule in rules.iter().filter(|r| r.matches(&normalized)) {
    if best.is_none_or(|b| rule.source.len() > b.source.len()) {
      best = Some(rule);
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;

  fn resolve(expression: &str) -> String {
    LicenseTable::default()
      .resolve(expression, DEFAULT_LICENSE_LABEL)
      .expect("expression should resolve")
  }

  fn rules(entries: &[(&str, &str)]) -> Vec<LicenseRule> {
    entries
      .iter()
      .filter_map(|(pattern, license)| LicenseRule::new(pattern, license))
      .collect()
  }

  #[test]
  fn test_resolve_comma_joins_with_or() {
    assert_eq!(resolve("mit,agpl"), "MIT OR AGPL-3.0-or-later");
  }

  #[test]
  fn test_resolve_and_expression() {
    assert_eq!(resolve("mit AND mpl"), "MIT AND MPL-2.0");
    assert_eq!(resolve("mit and mpl"), "MIT AND MPL-2.0");
  }

  #[test]
  fn test_resolve_mixed_and_or_prefers_or() {
    assert_eq!(resolve("mit AND mpl OR agpl"), "MIT OR MPL-2.0 OR AGPL-3.0-or-later");
  }

  #[test]
  fn test_resolve_other_separators() {
    assert_eq!(resolve("mit+agpl"), "MIT OR AGPL-3.0-or-later");
    assert_eq!(resolve("mit; mpl"), "MIT OR MPL-2.0");
    assert_eq!(resolve("mit & mpl"), "MIT OR MPL-2.0");
  }

  #[test]
  fn test_resolve_empty_uses_default_label() {
    assert_eq!(resolve(""), "MIT");
    assert_eq!(
      LicenseTable::default().resolve("  ", "agpl").expect("resolves"),
      "AGPL-3.0-or-later"
    );
  }

  #[test]
  fn test_resolve_canonical_ids_case_insensitive() {
    assert_eq!(resolve("mpl-2.0"), "MPL-2.0");
    assert_eq!(resolve("AGPL-3.0-OR-LATER"), "AGPL-3.0-or-later");
  }

  #[test]
  fn test_resolve_unknown_spdx_id_passes_through() {
    assert_eq!(resolve("CC-BY-SA-3.0"), "CC-BY-SA-3.0");
    assert_eq!(resolve("LicenseRef-Proprietary"), "LicenseRef-Proprietary");
  }

  #[test]
  fn test_resolve_with_exception_is_one_token() {
    assert_eq!(
      resolve("GPL-2.0-only WITH Classpath-exception-2.0"),
      "GPL-2.0-only WITH Classpath-exception-2.0"
    );
  }

  #[test]
  fn test_resolve_parenthesized_expression_keeps_grouping() {
    assert_eq!(resolve("(MIT OR Apache-2.0)"), "(MIT OR Apache-2.0)");
    assert_eq!(
      resolve("(mit or agpl) AND Apache-2.0"),
      "(MIT OR AGPL-3.0-or-later) AND Apache-2.0"
    );
    assert_eq!(
      resolve("(GPL-2.0-only WITH Classpath-exception-2.0)"),
      "(GPL-2.0-only WITH Classpath-exception-2.0)"
    );
  }

  #[test]
  fn test_resolve_unbalanced_parentheses_fail() {
    let table = LicenseTable::default();
    assert!(table.resolve("(MIT OR Apache-2.0", DEFAULT_LICENSE_LABEL).is_err());
    assert!(table.resolve("MIT)", DEFAULT_LICENSE_LABEL).is_err());
  }

  #[test]
  fn test_resolve_for_path_parenthesized_rule() {
    let table = LicenseTable::default();
    let rules = rules(&[("third_party/**", "(MIT OR Apache-2.0)")]);
    assert_eq!(
      resolve_for_path("third_party/x/lib.rs", "MIT", &rules, &table),
      "(MIT OR Apache-2.0)"
    );
  }

  #[test]
  fn test_resolve_rejects_non_spdx_token() {
    let err = LicenseTable::default()
      .resolve("mit, some license!", DEFAULT_LICENSE_LABEL)
      .expect_err("should fail");
    assert_eq!(
      err,
      LicenseError::Unresolvable {
        token: "some license!".to_string(),
        expression: "mit, some license!".to_string(),
      }
    );
  }

  #[test]
  fn test_resolve_or_default_falls_back() {
    let table = LicenseTable::default();
    assert_eq!(table.resolve_or_default("not a license", "mpl"), "MPL-2.0");
  }

  #[test]
  fn test_custom_labels() {
    let mut extra = HashMap::new();
    extra.insert("GPL".to_string(), "GPL-3.0-or-later".to_string());
    let table = LicenseTable::with_labels(&extra);
    assert_eq!(
      table.resolve("gpl,mit", DEFAULT_LICENSE_LABEL).expect("resolves"),
      "GPL-3.0-or-later OR MIT"
    );
  }

  #[test]
  fn test_normalize_rule_path() {
    assert_eq!(normalize_rule_path("./src/a.go"), "src/a.go");
    assert_eq!(normalize_rule_path("././/src\\b.go"), "src/b.go");
    assert_eq!(normalize_rule_path(".github/x.yml"), ".github/x.yml");
  }

  #[test]
  fn test_resolve_for_path_vendor_rule() {
    let table = LicenseTable::default();
    let rules = rules(&[("src/vendor/**", "mpl")]);
    assert_eq!(resolve_for_path("src/vendor/x.go", "MIT", &rules, &table), "MPL-2.0");
    assert_eq!(resolve_for_path("./src/vendor/x.go", "AGPL-3.0-or-later", &rules, &table), "MPL-2.0");
  }

  #[test]
  fn test_resolve_for_path_no_match_returns_default_unchanged() {
    let table = LicenseTable::default();
    let rules = rules(&[("docs/**", "mpl")]);
    assert_eq!(resolve_for_path("src/main.go", "MIT OR AGPL-3.0-or-later", &rules, &table), "MIT OR AGPL-3.0-or-later");
  }

  #[test]
  fn test_resolve_for_path_longest_pattern_wins() {
    let table = LicenseTable::default();
    let rules = rules(&[("src/**", "agpl"), ("src/vendor/**", "mpl"), ("*", "mit")]);
    assert_eq!(resolve_for_path("src/vendor/lib/a.cs", "MIT", &rules, &table), "MPL-2.0");
    assert_eq!(resolve_for_path("src/a.cs", "MIT", &rules, &table), "AGPL-3.0-or-later");
  }

  #[test]
  fn test_resolve_for_path_tie_goes_to_first_declared() {
    let table = LicenseTable::default();
    let rules = rules(&[("src/*.cs", "agpl"), ("src/a.*", "mpl")]);
    assert_eq!(resolve_for_path("src/a.cs", "MIT", &rules, &table), "AGPL-3.0-or-later");
  }

  #[test]
  fn test_resolve_for_path_is_case_sensitive() {
    let table = LicenseTable::default();
    let rules = rules(&[("Src/**", "mpl")]);
    assert_eq!(resolve_for_path("src/a.go", "MIT", &rules, &table), "MIT");
  }

  #[test]
  fn test_invalid_rule_is_skipped() {
    assert!(LicenseRule::new("src/***x", "mit").is_none());
    assert!(LicenseRule::new("src/**", "  ").is_none());
  }
}
