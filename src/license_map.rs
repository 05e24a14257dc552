//! # License Map Module
//!
//! Loads per-path [`LicenseRule`]s from the places a repository can declare
//! them:
//!
//! 1. inline JSON (`SPDXSTAMP_LICENSE_MAP_JSON`)
//! 2. an explicit JSON file (`--license-map`, `SPDXSTAMP_LICENSE_MAP_PATH` or
//!    the `license-map` config key)
//! 3. the conventional `.reuse/path-licenses.json` and
//!    `.github/reuse-license-map.json` files
//!
//! The first of these that yields a document wins. Rules from `REUSE.toml`
//! at the workspace root are always appended after them.
//!
//! Malformed sources are logged and skipped; loading never fails the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::license::LicenseRule;
use crate::verbose_log;

/// Conventional rule file locations, relative to the workspace root.
pub const CONVENTIONAL_MAP_PATHS: [&str; 2] = [".reuse/path-licenses.json", ".github/reuse-license-map.json"];

/// REUSE manifest file name.
pub const REUSE_TOML: &str = "REUSE.toml";

/// Where to look for license rules.
#[derive(Debug, Clone, Default)]
pub struct LicenseMapSources {
  /// Inline JSON document.
  pub inline_json: Option<String>,
  /// Explicit path to a JSON document.
  pub path: Option<PathBuf>,
  /// Directory that conventional paths and `REUSE.toml` are relative to.
  pub workspace_root: PathBuf,
}

/// Loads and compiles the license rules from `sources`.
pub fn load_license_rules(sources: &LicenseMapSources) -> Vec<LicenseRule> {
  let mut entries = load_json_entries(sources);

  let reuse_path = sources.workspace_root.join(REUSE_TOML);
  if reuse_path.exists() {
    match std::fs::read_to_string(&reuse_path)
      .with_context(|| format!("Failed to read {}", reuse_path.display()))
      .and_then(|text| parse_reuse_toml(&text))
    {
      Ok(reuse_entries) => {
        info!("Loaded {} license rules from {}", reuse_entries.len(), reuse_path.display());
        entries.extend(reuse_entries);
      }
      Err(e) => warn!("Failed to load {}: {:#}", reuse_path.display(), e),
    }
  }

  let rules: Vec<LicenseRule> = entries
    .iter()
    .filter_map(|(pattern, license)| LicenseRule::new(pattern, license))
    .collect();

  verbose_log!("Using {} license rules", rules.len());
  rules
}

fn load_json_entries(sources: &LicenseMapSources) -> Vec<(String, String)> {
  if let Some(inline) = sources.inline_json.as_deref().filter(|s| !s.trim().is_empty()) {
    match serde_json::from_str::<Value>(inline) {
      Ok(doc) => return rules_from_json(&doc),
      Err(e) => warn!("Failed to parse inline license map JSON: {}", e),
    }
  }

  if let Some(path) = &sources.path {
    let path = if path.is_absolute() {
      path.clone()
    } else {
      sources.workspace_root.join(path)
    };
    if path.exists() {
      match read_json(&path) {
        Ok(doc) => return rules_from_json(&doc),
        Err(e) => warn!("Failed to load license map from {}: {:#}", path.display(), e),
      }
    } else {
      warn!("License map {} does not exist", path.display());
    }
  }

  for candidate in CONVENTIONAL_MAP_PATHS {
    let path = sources.workspace_root.join(candidate);
    if !path.exists() {
      continue;
    }
    match read_json(&path) {
      Ok(doc) => {
        info!("Loaded license map from {}", candidate);
        return rules_from_json(&doc);
      }
      Err(e) => warn!("Failed to load license map from {}: {:#}", path.display(), e),
    }
  }

  Vec::new()
}

fn read_json(path: &Path) -> Result<Value> {
  let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Extracts `(pattern, license)` pairs from any of the accepted JSON shapes:
/// `{"rules": [{"pattern", "license"}]}`, `{pattern: license}` or a bare
/// `[{"pattern", "license"}]` array. Declaration order is preserved.
pub fn rules_from_json(doc: &Value) -> Vec<(String, String)> {
  match doc {
    Value::Object(map) => match map.get("rules") {
      Some(Value::Array(items)) => rules_from_array(items),
      _ => map
        .iter()
        .map(|(pattern, license)| (pattern.clone(), json_scalar(license)))
        .collect(),
    },
    Value::Array(items) => rules_from_array(items),
    _ => {
      warn!("Ignoring license map that is neither an object nor an array");
      Vec::new()
    }
  }
}

fn rules_from_array(items: &[Value]) -> Vec<(String, String)> {
  items
    .iter()
    .filter_map(|item| {
      let pattern = item.get("pattern")?;
      let license = item.get("license")?;
      Some((json_scalar(pattern), json_scalar(license)))
    })
    .collect()
}

fn json_scalar(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Extracts `(pattern, license)` pairs from a `REUSE.toml` document.
///
/// Both the `[[files]]` (`path`, `license`) shape and standard
/// `[[annotations]]` entries (`path` as a string or array,
/// `SPDX-License-Identifier`) are read.
pub fn parse_reuse_toml(text: &str) -> Result<Vec<(String, String)>> {
  let doc: toml::Table = toml::from_str(text).context("Invalid REUSE.toml")?;
  let mut entries = Vec::new();

  if let Some(toml::Value::Array(files)) = doc.get("files") {
    for entry in files.iter().filter_map(toml::Value::as_table) {
      let path = entry.get("path").and_then(toml::Value::as_str).unwrap_or("");
      let license = entry.get("license").and_then(toml::Value::as_str).unwrap_or("");
      push_reuse_path(&mut entries, path, license);
    }
  }

  if let Some(toml::Value::Array(annotations)) = doc.get("annotations") {
    for entry in annotations.iter().filter_map(toml::Value::as_table) {
      let license = entry
        .get("SPDX-License-Identifier")
        .and_then(toml::Value::as_str)
        .unwrap_or("");
      match entry.get("path") {
        Some(toml::Value::String(path)) => push_reuse_path(&mut entries, path, license),
        Some(toml::Value::Array(paths)) => {
          for path in paths.iter().filter_map(toml::Value::as_str) {
            push_reuse_path(&mut entries, path, license);
          }
        }
        _ => {}
      }
    }
  }

  Ok(entries)
}

/// Directory paths (trailing `/`) become `dir/**`; any other path covers both
/// itself and everything beneath it.
fn push_reuse_path(entries: &mut Vec<(String, String)>, path: &str, license: &str) {
  let path = path.trim().replace('\\', "/");
  let license = license.trim();
  if path.is_empty() || license.is_empty() {
    return;
  }

  if path.ends_with('/') {
    entries.push((format!("{path}**"), license.to_string()));
  } else {
    entries.push((path.clone(), license.to_string()));
    entries.push((format!("{path}/**"), license.to_string()));
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn patterns(rules: &[LicenseRule]) -> Vec<(&str, &str)> {
    rules.iter().map(|r| (r.pattern(), r.license())).collect()
  }

  #[test]
  fn test_rules_from_json_shapes() {
    let wrapped: Value = serde_json::from_str(r#"{"rules": [{"pattern": "a/**", "license": "mpl"}]}"#).expect("json");
    assert_eq!(rules_from_json(&wrapped), vec![("a/**".to_string(), "mpl".to_string())]);

    let object: Value = serde_json::from_str(r#"{"z/**": "agpl", "a/**": "mit"}"#).expect("json");
    assert_eq!(
      rules_from_json(&object),
      vec![
        ("z/**".to_string(), "agpl".to_string()),
        ("a/**".to_string(), "mit".to_string())
      ]
    );

    let array: Value =
      serde_json::from_str(r#"[{"pattern": "b/*", "license": "mit"}, {"pattern": "no-license"}]"#).expect("json");
    assert_eq!(rules_from_json(&array), vec![("b/*".to_string(), "mit".to_string())]);
  }

  #[test]
  fn test_parse_reuse_toml_files_and_annotations() {
    let text = concat!(
      "version = 1\n",
      "\n",
      "[[files]]\n",
      "path = \"Resources/Audio/\"\n",
      "license = \"CC-BY-SA-3.0\"\n",
      "\n",
      "[[files]]\n",
      "path = \"Content.Server\"\n",
      "license = \"agpl\"\n",
      "\n",
      "[[annotations]]\n",
      "path = [\"docs\", \"README.md\"]\n",
      "SPDX-License-Identifier = \"MIT\"\n",
    );

    let entries = parse_reuse_toml(text).expect("valid toml");
    let expected: Vec<(String, String)> = [
      ("Resources/Audio/**", "CC-BY-SA-3.0"),
      ("Content.Server", "agpl"),
      ("Content.Server/**", "agpl"),
      ("docs", "MIT"),
      ("docs/**", "MIT"),
      ("README.md", "MIT"),
      ("README.md/**", "MIT"),
    ]
    .iter()
    .map(|(p, l)| ((*p).to_string(), (*l).to_string()))
    .collect();
    assert_eq!(entries, expected);
  }

  #[test]
  fn test_parse_reuse_toml_rejects_invalid() {
    assert!(parse_reuse_toml("[[files]\n").is_err());
  }

  #[test]
  fn test_inline_json_wins_over_conventional_file() {
    let temp_dir = TempDir::new().expect("create temp dir");
    std::fs::create_dir_all(temp_dir.path().join(".reuse")).expect("mkdir");
    std::fs::write(
      temp_dir.path().join(".reuse/path-licenses.json"),
      r#"{"conventional/**": "mpl"}"#,
    )
    .expect("write map");

    let sources = LicenseMapSources {
      inline_json: Some(r#"{"inline/**": "agpl"}"#.to_string()),
      path: None,
      workspace_root: temp_dir.path().to_path_buf(),
    };
    let rules = load_license_rules(&sources);
    assert_eq!(patterns(&rules), vec![("inline/**", "agpl")]);
  }

  #[test]
  fn test_malformed_inline_falls_through_to_conventional() {
    let temp_dir = TempDir::new().expect("create temp dir");
    std::fs::create_dir_all(temp_dir.path().join(".github")).expect("mkdir");
    std::fs::write(
      temp_dir.path().join(".github/reuse-license-map.json"),
      r#"[{"pattern": "vendor/**", "license": "mpl"}]"#,
    )
    .expect("write map");

    let sources = LicenseMapSources {
      inline_json: Some("{not json".to_string()),
      path: None,
      workspace_root: temp_dir.path().to_path_buf(),
    };
    let rules = load_license_rules(&sources);
    assert_eq!(patterns(&rules), vec![("vendor/**", "mpl")]);
  }

  #[test]
  fn test_explicit_path_and_reuse_toml_are_combined() {
    let temp_dir = TempDir::new().expect("create temp dir");
    std::fs::write(temp_dir.path().join("map.json"), r#"{"rules": [{"pattern": "src/**", "license": "agpl"}]}"#)
      .expect("write map");
    std::fs::write(
      temp_dir.path().join(REUSE_TOML),
      "[[files]]\npath = \"third_party/\"\nlicense = \"mpl\"\n",
    )
    .expect("write reuse");

    let sources = LicenseMapSources {
      inline_json: None,
      path: Some(PathBuf::from("map.json")),
      workspace_root: temp_dir.path().to_path_buf(),
    };
    let rules = load_license_rules(&sources);
    assert_eq!(patterns(&rules), vec![("src/**", "agpl"), ("third_party/**", "mpl")]);
  }

  #[test]
  fn test_no_sources_yields_no_rules() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let sources = LicenseMapSources {
      workspace_root: temp_dir.path().to_path_buf(),
      ..LicenseMapSources::default()
    };
    assert!(load_license_rules(&sources).is_empty());
  }
}
