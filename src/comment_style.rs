//! # Comment Style Module
//!
//! This module maps files to the comment delimiters their SPDX header is
//! written with.
//!
//! The module includes:
//! - [`CommentStyle`] describing a line prefix and an optional block suffix
//! - [`CommentStyleResolver`] for choosing a style for a path
//! - [`BuiltinResolver`] backed by a fixed extension table
//! - [`ConfigurableResolver`] that consults user configuration first
//!
//! A path with no known style is unsupported: the resolvers return `None`
//! and the file is skipped.

use std::path::Path;
use std::sync::Arc;

use crate::config::{CommentStyleConfig, Config};
use crate::verbose_log;

/// Comment delimiters for a file type.
///
/// When `block_suffix` is `None` every header line is prefixed with
/// `line_prefix` (e.g. `//`, `#`). When it is present the header is a single
/// comment block opened by `line_prefix` and closed by `block_suffix`, each on
/// a line of its own (e.g. `<!--` … `-->`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentStyle {
  /// Per-line prefix, or the block-open marker for block styles
  pub line_prefix: String,

  /// Block-close marker; absent for single-line comment styles
  pub block_suffix: Option<String>,
}

impl CommentStyle {
  /// Create a single-line comment style.
  pub fn line(prefix: &str) -> Self {
    Self {
      line_prefix: prefix.to_string(),
      block_suffix: None,
    }
  }

  /// Create a block comment style.
  pub fn block(open: &str, close: &str) -> Self {
    Self {
      line_prefix: open.to_string(),
      block_suffix: Some(close.to_string()),
    }
  }

  /// Returns `true` for block (open/close) comment styles.
  pub const fn is_block(&self) -> bool {
    self.block_suffix.is_some()
  }
}

impl From<&CommentStyleConfig> for CommentStyle {
  fn from(config: &CommentStyleConfig) -> Self {
    Self {
      line_prefix: config.prefix.clone(),
      block_suffix: config.suffix.clone().filter(|s| !s.is_empty()),
    }
  }
}

/// Trait for resolving comment styles for file paths.
///
/// Implementations can use built-in mappings, user configuration, or both.
pub trait CommentStyleResolver: Send + Sync {
  /// Resolve the comment style for the given file path, or `None` when the
  /// file type is not supported.
  fn resolve(&self, path: &Path) -> Option<CommentStyle>;
}

/// Default resolver using the built-in extension table.
#[derive(Debug, Default)]
pub struct BuiltinResolver;

impl CommentStyleResolver for BuiltinResolver {
  fn resolve(&self, path: &Path) -> Option<CommentStyle> {
    builtin_style_for_file(path)
  }
}

/// Resolver that checks user config first, then falls back to the builtin
/// table.
pub struct ConfigurableResolver {
  config: Arc<Config>,
}

impl std::fmt::Debug for ConfigurableResolver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ConfigurableResolver")
      .field("config", &"<config>")
      .finish()
  }
}

impl ConfigurableResolver {
  pub fn new(config: Config) -> Self {
    Self {
      config: Arc::new(config),
    }
  }

  /// Create a resolver sharing an already loaded config.
  pub const fn from_arc(config: Arc<Config>) -> Self {
    Self { config }
  }
}

impl CommentStyleResolver for ConfigurableResolver {
  fn resolve(&self, path: &Path) -> Option<CommentStyle> {
    let file_name = lowercase_file_name(path);

    // 1. Exact filename match
    if let Some(style) = self.config.filenames.get(&file_name) {
      verbose_log!("Using config filename override for: {}", file_name);
      return Some(CommentStyle::from(style));
    }

    // 2. Filename glob match
    for (pattern, style) in &self.config.filenames {
      if pattern.contains('*')
        && let Ok(glob_pattern) = glob::Pattern::new(pattern)
        && glob_pattern.matches(&file_name)
      {
        verbose_log!("Using config filename glob override '{}' for: {}", pattern, file_name);
        return Some(CommentStyle::from(style));
      }
    }

    // 3. Extension override
    let extension = lowercase_extension(path);
    if let Some(style) = self.config.comment_styles.get(&extension) {
      verbose_log!("Using config extension override for: .{}", extension);
      return Some(CommentStyle::from(style));
    }

    // 4. Builtin table
    builtin_style_for_file(path)
  }
}

/// Create a comment style resolver based on the provided configuration.
pub fn create_resolver(config: Option<Arc<Config>>) -> Box<dyn CommentStyleResolver> {
  match config {
    Some(cfg) => Box::new(ConfigurableResolver::from_arc(cfg)),
    None => Box::new(BuiltinResolver),
  }
}

fn lowercase_file_name(path: &Path) -> String {
  path
    .file_name()
    .and_then(|name| name.to_str())
    .unwrap_or("")
    .to_lowercase()
}

fn lowercase_extension(path: &Path) -> String {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .unwrap_or("")
    .to_lowercase()
}

/// Looks up the builtin comment style for a file.
///
/// The extension is compared case-insensitively. Extension-less dotfiles such
/// as `.gitignore` are matched on their whole name.
fn builtin_style_for_file(path: &Path) -> Option<CommentStyle> {
  let file_name = lowercase_file_name(path);

  match file_name.as_str() {
    ".gitignore" | ".dockerignore" => return Some(CommentStyle::line("#")),
    _ => {}
  }

  let extension = lowercase_extension(path);
  let style = match extension.as_str() {
    "cs" | "js" | "ts" | "jsx" | "tsx" | "c" | "cpp" | "cc" | "h" | "hpp" | "java" | "scala" | "kt" | "swift" | "go"
    | "rs" | "dart" | "groovy" | "php" => CommentStyle::line("//"),
    "yaml" | "yml" | "ftl" | "py" | "rb" | "pl" | "pm" | "sh" | "bash" | "zsh" | "fish" | "ps1" | "r" | "rmd" | "jl"
    | "tcl" | "perl" | "conf" | "toml" | "ini" | "cfg" => CommentStyle::line("#"),
    "bat" | "cmd" => CommentStyle::line("REM"),
    "vb" | "vbs" | "bas" => CommentStyle::line("'"),
    "asm" | "s" | "lisp" | "clj" => CommentStyle::line(";"),
    "f" | "f90" => CommentStyle::line("!"),
    "m" => CommentStyle::line("%"),
    "sql" | "ada" | "adb" | "ads" | "hs" | "lhs" | "lua" => CommentStyle::line("--"),
    "xaml" | "xml" | "html" | "htm" | "svg" | "md" | "markdown" => CommentStyle::block("<!--", "-->"),
    "css" | "scss" | "sass" | "less" => CommentStyle::block("/*", "*/"),
    _ => return None,
  };

  Some(style)
}
