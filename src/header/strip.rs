//! Removing existing header blocks.

use super::{classify_line, leading_spdx_blocks, lines_with_offsets};
use crate::comment_style::CommentStyle;

/// Removes the header at the top of `content` together with the blank lines
/// that follow it.
///
/// Returns the remaining content, which is a suffix of `content` so its line
/// endings are untouched, and whether anything was removed. Content without a
/// header is returned unchanged with `false`.
pub fn strip_existing<'a>(content: &'a str, style: &CommentStyle) -> (&'a str, bool) {
  let lines = lines_with_offsets(content);

  let next = match &style.block_suffix {
    None => {
      let header_end = lines
        .iter()
        .take_while(|(_, line)| !classify_line(line, &style.line_prefix).is_terminator())
        .count();
      if header_end == 0 {
        return (content, false);
      }
      header_end
        + lines[header_end..]
          .iter()
          .take_while(|(_, line)| line.trim().is_empty())
          .count()
    }
    Some(close) => {
      let (blocks, next) = leading_spdx_blocks(&lines, &style.line_prefix, close);
      if blocks.is_empty() {
        return (content, false);
      }
      next
    }
  };

  let offset = lines.get(next).map_or(content.len(), |(start, _)| *start);
  (&content[offset..], true)
}
