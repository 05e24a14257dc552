//! Per-line classification of header content.

use std::sync::LazyLock;

use regex::Regex;

const COPYRIGHT_TAG: &str = "SPDX-FileCopyrightText:";
const LICENSE_TAG: &str = "SPDX-License-Identifier:";
const STRAY_MARKER: &str = "//";

static YEAR_AND_AUTHOR: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(\d{4})\s+(.+)$").expect("copyright regex must compile"));

/// What a single line contributes to a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
  /// A comment line with nothing after the prefix.
  Separator,
  /// `SPDX-FileCopyrightText: <year> <author>`.
  Copyright { year: i32, author: &'a str },
  /// Any other `SPDX-FileCopyrightText:` line, such as the generic
  /// contributors attribution. Part of the header, but records no author.
  Attribution,
  /// `SPDX-License-Identifier: <expression>`.
  License(&'a str),
  /// Another `SPDX-` tag.
  OtherSpdx,
  /// Anything else; the header ends before this line.
  Terminator,
}

impl LineKind<'_> {
  pub const fn is_terminator(&self) -> bool {
    matches!(self, LineKind::Terminator)
  }
}

/// Classifies a line of a single-line comment style header.
///
/// The line must start with `prefix` after leading whitespace. One stray `//`
/// after the prefix is tolerated (`# // SPDX-...`).
pub fn classify_line<'a>(line: &'a str, prefix: &str) -> LineKind<'a> {
  let Some(rest) = line.trim_start().strip_prefix(prefix) else {
    return LineKind::Terminator;
  };

  let rest = rest.trim();
  if rest.is_empty() {
    return LineKind::Separator;
  }

  let rest = rest.strip_prefix(STRAY_MARKER).map_or(rest, str::trim_start);
  classify_content(rest)
}

/// Classifies a line inside a block comment, where lines carry no prefix.
pub fn classify_block_line(line: &str) -> LineKind<'_> {
  let text = line.trim();
  if text.is_empty() {
    return LineKind::Separator;
  }
  classify_content(text)
}

fn classify_content(text: &str) -> LineKind<'_> {
  if let Some(rest) = text.strip_prefix(COPYRIGHT_TAG) {
    return match YEAR_AND_AUTHOR.captures(rest.trim()) {
      Some(caps) => match (caps.get(1), caps.get(2)) {
        (Some(year), Some(author)) => match year.as_str().parse() {
          Ok(year) => LineKind::Copyright {
            year,
            author: author.as_str().trim(),
          },
          Err(_) => LineKind::Attribution,
        },
        _ => LineKind::Attribution,
      },
      None => LineKind::Attribution,
    };
  }

  if let Some(rest) = text.strip_prefix(LICENSE_TAG) {
    let expression = rest.trim();
    if expression.is_empty() {
      return LineKind::OtherSpdx;
    }
    return LineKind::License(expression);
  }

  if text.starts_with("SPDX-") {
    return LineKind::OtherSpdx;
  }

  LineKind::Terminator
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_copyright_line() {
    assert_eq!(
      classify_line("// SPDX-FileCopyrightText: 2023 Ada <ada@x.com>\n", "//"),
      LineKind::Copyright {
        year: 2023,
        author: "Ada <ada@x.com>"
      }
    );
  }

  #[test]
  fn test_license_line() {
    assert_eq!(
      classify_line("# SPDX-License-Identifier: MIT OR AGPL-3.0-or-later\r\n", "#"),
      LineKind::License("MIT OR AGPL-3.0-or-later")
    );
  }

  #[test]
  fn test_separator_and_indentation() {
    assert_eq!(classify_line("//\n", "//"), LineKind::Separator);
    assert_eq!(classify_line("   //   \n", "//"), LineKind::Separator);
  }

  #[test]
  fn test_stray_marker_is_tolerated() {
    assert_eq!(
      classify_line("# // SPDX-License-Identifier: MIT", "#"),
      LineKind::License("MIT")
    );
    assert_eq!(classify_line("# // regular comment", "#"), LineKind::Terminator);
  }

  #[test]
  fn test_generic_attribution_and_other_tags() {
    assert_eq!(
      classify_line("// SPDX-FileCopyrightText: Contributors to the Station project", "//"),
      LineKind::Attribution
    );
    assert_eq!(classify_line("// SPDX-PackageName: x", "//"), LineKind::OtherSpdx);
  }

  #[test]
  fn test_terminators() {
    assert!(classify_line("package main", "//").is_terminator());
    assert!(classify_line("// Package main does things.", "//").is_terminator());
    assert!(classify_line("", "//").is_terminator());
    assert!(classify_line("/// doc", "//").is_terminator());
  }

  #[test]
  fn test_block_lines() {
    assert_eq!(classify_block_line("   \n"), LineKind::Separator);
    assert_eq!(classify_block_line("SPDX-License-Identifier: MPL-2.0"), LineKind::License("MPL-2.0"));
    assert_eq!(
      classify_block_line("  SPDX-FileCopyrightText: 2020 Bob"),
      LineKind::Copyright { year: 2020, author: "Bob" }
    );
    assert!(classify_block_line("Some prose").is_terminator());
  }
}
