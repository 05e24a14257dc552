//! # Configuration Module
//!
//! This module provides configuration support for spdxstamp: the run policy
//! (default license, attribution project name, author handling switches),
//! license label extensions, automation identity names and comment style
//! overrides.
//!
//! Configuration can be specified in a `.spdxstamp.toml` file or via the
//! `SPDXSTAMP_CONFIG` environment variable. Individual policy switches can be
//! overridden through `SPDXSTAMP_*` environment variables, and the CLI applies
//! its own flags last. The merged result is a [`Policy`] value that is passed
//! explicitly to the reconciler.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::license::DEFAULT_LICENSE_LABEL;
use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".spdxstamp.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "SPDXSTAMP_CONFIG";

/// Environment variable overriding the attribution project name.
pub const PROJECT_NAME_ENV_VAR: &str = "SPDXSTAMP_PROJECT_NAME";

/// `owner/name` of the repository when running in GitHub Actions.
pub const GITHUB_REPOSITORY_ENV_VAR: &str = "GITHUB_REPOSITORY";

/// Truthy value disables adding the current git user as a contributor.
pub const SKIP_ADD_CURRENT_ENV_VAR: &str = "SPDXSTAMP_SKIP_ADD_CURRENT";

/// Truthy value renders identities without their e-mail address.
pub const STRIP_EMAILS_ENV_VAR: &str = "SPDXSTAMP_STRIP_EMAILS";

/// Truthy value replaces existing license identifiers with the default.
pub const FORCE_LICENSE_ENV_VAR: &str = "SPDXSTAMP_FORCE_LICENSE";

/// Inline JSON license rules.
pub const LICENSE_MAP_JSON_ENV_VAR: &str = "SPDXSTAMP_LICENSE_MAP_JSON";

/// Path to a JSON license rule file.
pub const LICENSE_MAP_PATH_ENV_VAR: &str = "SPDXSTAMP_LICENSE_MAP_PATH";

/// Project name used when nothing else names the project.
pub const FALLBACK_PROJECT_NAME: &str = "Project";

/// User-defined comment style configuration.
///
/// `suffix` is only set for block comment styles.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommentStyleConfig {
  /// Line prefix, or the block-open marker when `suffix` is set.
  pub prefix: String,

  /// Block-close marker.
  #[serde(default)]
  pub suffix: Option<String>,
}

impl CommentStyleConfig {
  pub fn line(prefix: &str) -> Self {
    Self {
      prefix: prefix.to_string(),
      suffix: None,
    }
  }

  pub fn block(open: &str, close: &str) -> Self {
    Self {
      prefix: open.to_string(),
      suffix: Some(close.to_string()),
    }
  }
}

/// Main configuration struct, loaded from a `.spdxstamp.toml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
  /// License label or expression used when no path rule applies.
  #[serde(default)]
  pub default_license: Option<String>,

  /// Project name used in the generic attribution line.
  #[serde(default)]
  pub project_name: Option<String>,

  /// Whether the current git user is added as a contributor.
  #[serde(default)]
  pub add_current_user: Option<bool>,

  /// Whether identities are rendered without e-mail addresses.
  #[serde(default)]
  pub strip_emails: Option<bool>,

  /// Whether existing license identifiers are replaced by the default.
  #[serde(default)]
  pub force_license: Option<bool>,

  /// Path to a JSON file with per-path license rules.
  #[serde(default)]
  pub license_map: Option<PathBuf>,

  /// Extra name substrings identifying automation accounts.
  #[serde(default)]
  pub automation_names: Vec<String>,

  /// Extra shorthand label to SPDX id entries.
  #[serde(default)]
  pub license_labels: HashMap<String, String>,

  /// Custom comment styles for file extensions (without the leading dot).
  #[serde(default)]
  pub comment_styles: HashMap<String, CommentStyleConfig>,

  /// Filename-specific comment style overrides (exact names or globs).
  #[serde(default)]
  pub filenames: HashMap<String, CommentStyleConfig>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// A comment style configuration is invalid.
  #[error("Invalid comment style for '{extension}': {message}")]
  InvalidCommentStyle { extension: String, message: String },
}

impl Config {
  /// Load configuration from a file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    Self::parse(&content, path)
  }

  /// Parse configuration text; `path` is only used for error messages.
  pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
    let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    config.validate()?;

    let config = config.normalize();

    verbose_log!(
      "Loaded {} comment style overrides and {} license labels",
      config.comment_styles.len() + config.filenames.len(),
      config.license_labels.len()
    );

    Ok(config)
  }

  /// Checks that comment style prefixes are non-empty and that extension
  /// keys don't include the leading dot.
  fn validate(&self) -> Result<(), ConfigError> {
    for (ext, style) in &self.comment_styles {
      if style.prefix.trim().is_empty() {
        return Err(ConfigError::InvalidCommentStyle {
          extension: ext.clone(),
          message: "prefix cannot be empty".to_string(),
        });
      }

      if ext.starts_with('.') {
        return Err(ConfigError::InvalidCommentStyle {
          extension: ext.clone(),
          message: "extension should not include leading dot".to_string(),
        });
      }
    }

    for (filename, style) in &self.filenames {
      if style.prefix.trim().is_empty() {
        return Err(ConfigError::InvalidCommentStyle {
          extension: filename.clone(),
          message: "prefix cannot be empty".to_string(),
        });
      }
    }

    Ok(())
  }

  /// Check if the configuration has any comment style overrides.
  pub fn has_comment_overrides(&self) -> bool {
    !self.comment_styles.is_empty() || !self.filenames.is_empty()
  }

  /// Normalize lookup keys to lowercase for case-insensitive matching.
  fn normalize(self) -> Self {
    let comment_styles = self
      .comment_styles
      .into_iter()
      .map(|(k, v)| (k.to_lowercase(), v))
      .collect();

    let filenames = self.filenames.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect();

    let license_labels = self
      .license_labels
      .into_iter()
      .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
      .collect();

    Self {
      comment_styles,
      filenames,
      license_labels,
      ..self
    }
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `SPDXSTAMP_CONFIG` environment variable
/// 3. `.spdxstamp.toml` in the workspace root
pub fn discover_config_path(explicit_path: Option<&Path>, workspace_root: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    // A missing explicit file surfaces as a read error when loading.
    verbose_log!("Using explicit config path: {}", path.display());
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let workspace_config = workspace_root.join(DEFAULT_CONFIG_FILENAME);
  if workspace_config.exists() {
    verbose_log!("Using workspace config: {}", workspace_config.display());
    return Some(workspace_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path.
///
/// Returns `Ok(None)` when discovery is disabled or no file exists.
pub fn load_config(explicit_path: Option<&Path>, workspace_root: &Path, no_config: bool) -> Result<Option<Config>> {
  if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
    return Ok(None);
  }

  match discover_config_path(explicit_path, workspace_root) {
    Some(path) => {
      let config = Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))?;
      Ok(Some(config))
    }
    None => Ok(None),
  }
}

/// Interprets `1`, `true` and `yes` (any case) as enabled.
pub fn is_truthy(value: &str) -> bool {
  matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Run-wide policy for header reconciliation.
///
/// Every value here is explicit so that no entry point depends on ambient
/// process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
  /// License label or expression for files without a matching path rule.
  pub default_license: String,
  /// Project name used in the generic attribution line.
  pub project_name: String,
  /// Add the current git user as a contributor with the current year.
  pub add_current_user: bool,
  /// Render identities without their e-mail address.
  pub strip_emails: bool,
  /// Replace existing license identifiers with the file's default license.
  pub force_license: bool,
  /// Calendar year used for synthetic contributions.
  pub current_year: i32,
}

impl Policy {
  /// Built-in defaults.
  pub fn new(current_year: i32) -> Self {
    Self {
      default_license: DEFAULT_LICENSE_LABEL.to_string(),
      project_name: FALLBACK_PROJECT_NAME.to_string(),
      add_current_user: true,
      strip_emails: false,
      force_license: false,
      current_year,
    }
  }

  /// Builds a policy from defaults, an optional config file and environment
  /// variables, in increasing order of precedence.
  ///
  /// `env` looks up an environment variable; pass `|k| std::env::var(k).ok()`
  /// for the real process environment.
  pub fn from_sources(config: Option<&Config>, env: impl Fn(&str) -> Option<String>, current_year: i32) -> Self {
    let mut policy = Self::new(current_year);

    if let Some(config) = config {
      if let Some(license) = config.default_license.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        policy.default_license = license.to_string();
      }
      if let Some(name) = config.project_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        policy.project_name = name.to_string();
      }
      if let Some(add) = config.add_current_user {
        policy.add_current_user = add;
      }
      if let Some(strip) = config.strip_emails {
        policy.strip_emails = strip;
      }
      if let Some(force) = config.force_license {
        policy.force_license = force;
      }
    }

    let configured_name = config.and_then(|c| c.project_name.as_deref()).is_some();
    if let Some(name) = env(PROJECT_NAME_ENV_VAR).filter(|n| !n.trim().is_empty()) {
      policy.project_name = name.trim().to_string();
    } else if !configured_name
      && let Some(repo) = env(GITHUB_REPOSITORY_ENV_VAR)
      && let Some(tail) = repo.rsplit('/').next().filter(|t| !t.is_empty())
    {
      policy.project_name = tail.to_string();
    }

    if env(SKIP_ADD_CURRENT_ENV_VAR).is_some_and(|v| is_truthy(&v)) {
      policy.add_current_user = false;
    }
    if env(STRIP_EMAILS_ENV_VAR).is_some_and(|v| is_truthy(&v)) {
      policy.strip_emails = true;
    }
    if env(FORCE_LICENSE_ENV_VAR).is_some_and(|v| is_truthy(&v)) {
      policy.force_license = true;
    }

    policy
  }
}
