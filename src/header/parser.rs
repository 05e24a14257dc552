//! Extracting the facts recorded in an existing header.

use std::ops::Range;

use super::{LineKind, classify_block_line, classify_line, leading_spdx_blocks, lines_with_offsets};
use crate::comment_style::CommentStyle;
use crate::contributors::{AuthorSet, ContributionFact};

/// Facts recorded in a file's existing header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderParseResult {
  /// One single-year fact per copyright line, in file order. The same author
  /// may appear more than once.
  pub authors: Vec<ContributionFact>,
  /// The last license identifier found; `None` means the file has no header.
  pub license_expression: Option<String>,
  /// Header lines, `[start, end)`, counted from the start of the content.
  pub line_span: Range<usize>,
}

impl HeaderParseResult {
  /// The recorded authors merged into a set.
  pub fn author_set(&self) -> AuthorSet {
    self.authors.iter().cloned().collect()
  }

  /// `true` when some header lines were found but no license line.
  pub fn is_malformed(&self) -> bool {
    self.license_expression.is_none() && !self.line_span.is_empty()
  }
}

/// Parses the header at the top of `content`.
///
/// With a single-line style the header is every line from the top up to the
/// first line that is not a comment separator or an SPDX line; scanning never
/// resumes after that. With a block style the header is every leading
/// complete comment block containing SPDX lines.
pub fn parse(content: &str, style: &CommentStyle) -> HeaderParseResult {
  let lines = lines_with_offsets(content);
  let mut result = HeaderParseResult::default();

  let mut record = |kind: LineKind<'_>| match kind {
    LineKind::Copyright { year, author } => result.authors.push(ContributionFact::single(author, year)),
    LineKind::License(expression) => result.license_expression = Some(expression.to_string()),
    _ => {}
  };

  let span = match &style.block_suffix {
    None => {
      let mut end = 0;
      for (_, line) in &lines {
        let kind = classify_line(line, &style.line_prefix);
        if kind.is_terminator() {
          break;
        }
        record(kind);
        end += 1;
      }
      0..end
    }
    Some(close) => {
      let (blocks, _) = leading_spdx_blocks(&lines, &style.line_prefix, close);
      for block in &blocks {
        for (_, line) in &lines[block.open + 1..block.close] {
          record(classify_block_line(line));
        }
      }
      match (blocks.first(), blocks.last()) {
        (Some(first), Some(last)) => first.open..last.close + 1,
        _ => 0..0,
      }
    }
  };

  result.line_span = span;
  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_single_line_header() {
    let content = concat!(
      "// SPDX-FileCopyrightText: 2021 Ada <ada@x.com>\n",
      "// SPDX-FileCopyrightText: 2023 Ada <ada@x.com>\n",
      "// SPDX-FileCopyrightText: 2022 Bob\n",
      "//\n",
      "// SPDX-License-Identifier: MIT\n",
      "\n",
      "package main\n",
    );

    let result = parse(content, &CommentStyle::line("//"));
    assert_eq!(result.license_expression.as_deref(), Some("MIT"));
    assert_eq!(result.line_span, 0..5);
    assert_eq!(
      result.authors,
      vec![
        ContributionFact::single("Ada <ada@x.com>", 2021),
        ContributionFact::single("Ada <ada@x.com>", 2023),
        ContributionFact::single("Bob", 2022),
      ]
    );

    let set = result.author_set();
    let ada = set.get("Ada <ada@x.com>").expect("ada");
    assert_eq!((ada.first_year, ada.last_year), (2021, 2023));
  }

  #[test]
  fn test_parse_stops_at_first_non_header_line() {
    let content = concat!(
      "# SPDX-FileCopyrightText: 2021 Ada\n",
      "# A regular comment\n",
      "# SPDX-License-Identifier: MIT\n",
    );
    let result = parse(content, &CommentStyle::line("#"));
    assert_eq!(result.license_expression, None);
    assert_eq!(result.authors.len(), 1);
    assert_eq!(result.line_span, 0..1);
    assert!(result.is_malformed());
  }

  #[test]
  fn test_parse_does_not_resume_after_blank_line() {
    let content = "# SPDX-FileCopyrightText: 2021 Ada\n\n# SPDX-License-Identifier: MIT\n";
    let result = parse(content, &CommentStyle::line("#"));
    assert_eq!(result.license_expression, None);
  }

  #[test]
  fn test_parse_no_header() {
    let result = parse("package main\n// SPDX-License-Identifier: MIT\n", &CommentStyle::line("//"));
    assert_eq!(result, HeaderParseResult::default());
    assert!(!result.is_malformed());
  }

  #[test]
  fn test_parse_last_license_wins() {
    let content = "// SPDX-License-Identifier: MIT\n// SPDX-License-Identifier: MPL-2.0\n";
    let result = parse(content, &CommentStyle::line("//"));
    assert_eq!(result.license_expression.as_deref(), Some("MPL-2.0"));
  }

  #[test]
  fn test_parse_block_header() {
    let content = concat!(
      "<!--\n",
      "SPDX-FileCopyrightText: 2020 Ada <ada@x.com>\n",
      "\n",
      "SPDX-License-Identifier: MIT\n",
      "-->\n",
      "\n",
      "<root/>\n",
    );
    let result = parse(content, &CommentStyle::block("<!--", "-->"));
    assert_eq!(result.license_expression.as_deref(), Some("MIT"));
    assert_eq!(result.authors, vec![ContributionFact::single("Ada <ada@x.com>", 2020)]);
    assert_eq!(result.line_span, 0..5);
  }

  #[test]
  fn test_parse_partial_block_yields_nothing() {
    let content = "<!--\nSPDX-License-Identifier: MIT\n<root/>\n";
    let result = parse(content, &CommentStyle::block("<!--", "-->"));
    assert_eq!(result, HeaderParseResult::default());
  }

  #[test]
  fn test_parse_ignores_prose_inside_block() {
    let content = "/*\nCopyright notes\nSPDX-License-Identifier: MPL-2.0\n*/\nbody {}\n";
    let result = parse(content, &CommentStyle::block("/*", "*/"));
    assert_eq!(result.license_expression.as_deref(), Some("MPL-2.0"));
  }
}
