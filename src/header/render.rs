//! Rendering the canonical header text.

use crate::comment_style::CommentStyle;
use crate::contributors::ContributionFact;

/// Renders a header for `authors` (already in display order) and `license`.
///
/// Each author gets one copyright line showing their last year. Without
/// authors a generic attribution to `project_name` is written instead. A
/// separator and the license line always follow. The result has no trailing
/// newline.
pub fn render(authors: &[ContributionFact], license: &str, style: &CommentStyle, project_name: &str) -> String {
  let mut body: Vec<String> = if authors.is_empty() {
    vec![format!(
      "SPDX-FileCopyrightText: Contributors to the {project_name} project"
    )]
  } else {
    authors
      .iter()
      .map(|fact| format!("SPDX-FileCopyrightText: {} {}", fact.last_year, fact.identity))
      .collect()
  };
  body.push(String::new());
  body.push(format!("SPDX-License-Identifier: {license}"));

  match &style.block_suffix {
    None => body
      .iter()
      .map(|text| {
        if text.is_empty() {
          style.line_prefix.clone()
        } else {
          format!("{} {}", style.line_prefix, text)
        }
      })
      .collect::<Vec<_>>()
      .join("\n"),
    Some(close) => {
      let mut lines = Vec::with_capacity(body.len() + 2);
      lines.push(style.line_prefix.clone());
      lines.extend(body);
      lines.push(close.clone());
      lines.join("\n")
    }
  }
}
