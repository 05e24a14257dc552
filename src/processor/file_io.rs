//! # File I/O Module
//!
//! Async file reading and all-or-nothing writing for the reconciler.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

const UTF8_BOM: &str = "\u{feff}";

/// The bytes of a file and its text without a byte order mark.
#[derive(Debug, Clone)]
pub struct FileContent {
  pub raw: Vec<u8>,
  pub text: String,
}

/// File I/O operations for the reconciler.
pub struct FileIO;

impl FileIO {
  /// Reads a file as UTF-8, dropping a leading byte order mark.
  ///
  /// Fails if the file cannot be read or is not valid UTF-8.
  pub async fn read(path: &Path) -> Result<FileContent> {
    let raw = tokio::fs::read(path)
      .await
      .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let text = std::str::from_utf8(&raw)
      .with_context(|| format!("File is not valid UTF-8: {}", path.display()))?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string();

    Ok(FileContent { raw, text })
  }

  /// Replaces the file's content atomically.
  ///
  /// The content goes to a temporary file in the same directory that takes
  /// over the target's permissions and is then persisted over it. On failure
  /// the target is left untouched and the temporary file is removed.
  pub async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let target = path.to_path_buf();
    let content = content.to_string();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&target, &content))
      .await
      .with_context(|| format!("Write task for {} did not complete", path.display()))?
  }
}

fn write_atomic_blocking(path: &Path, content: &str) -> Result<()> {
  let dir = path
    .parent()
    .filter(|dir| !dir.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));

  let mut temp = NamedTempFile::new_in(dir)
    .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
  temp
    .write_all(content.as_bytes())
    .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;

  if let Ok(metadata) = std::fs::metadata(path) {
    std::fs::set_permissions(temp.path(), metadata.permissions())
      .with_context(|| format!("Failed to copy permissions of {}", path.display()))?;
  }

  temp
    .persist(path)
    .map_err(|e| e.error)
    .with_context(|| format!("Failed to replace file: {}", path.display()))?;
  Ok(())
}
