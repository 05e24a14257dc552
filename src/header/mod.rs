//! # Header Module
//!
//! Reading, removing and writing SPDX header blocks.
//!
//! - [`classify`] tags individual lines
//! - [`parser`] extracts the facts recorded in an existing header
//! - [`strip`] removes existing header blocks
//! - [`render`] produces the canonical header text
//!
//! The parser and the stripper share the classifier and the block scanner so
//! that they always agree on where a header ends.

pub mod classify;
pub mod parser;
pub mod render;
pub mod strip;

pub use classify::{LineKind, classify_block_line, classify_line};
pub use parser::{HeaderParseResult, parse};
pub use render::render;
pub use strip::strip_existing;

/// Lines of `content` paired with the byte offset each starts at.
///
/// The line text keeps its terminator; classification trims it.
pub fn lines_with_offsets(content: &str) -> Vec<(usize, &str)> {
  let mut offset = 0;
  content
    .split_inclusive('\n')
    .map(|line| {
      let start = offset;
      offset += line.len();
      (start, line)
    })
    .collect()
}

/// A complete leading comment block: the open and close marker line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
  pub open: usize,
  pub close: usize,
}

/// Finds the stacked comment blocks at the top of `lines` that contain at
/// least one `SPDX-` line.
///
/// Scanning stops at the first line that does not open a block, at a block
/// without a close marker, or at a block without SPDX content. Blank lines
/// between blocks are skipped. Returns the blocks and the index of the first
/// line after the last block and its trailing blank lines.
pub fn leading_spdx_blocks(lines: &[(usize, &str)], open: &str, close: &str) -> (Vec<BlockSpan>, usize) {
  let mut blocks = Vec::new();
  let mut next = 0;

  while next < lines.len() && lines[next].1.trim() == open {
    let Some(close_at) = (next + 1..lines.len()).find(|&k| lines[k].1.trim() == close) else {
      break;
    };

    if !lines[next + 1..close_at].iter().any(|(_, line)| line.contains("SPDX-")) {
      break;
    }

    blocks.push(BlockSpan {
      open: next,
      close: close_at,
    });

    next = close_at + 1;
    while next < lines.len() && lines[next].1.trim().is_empty() {
      next += 1;
    }
  }

  (blocks, next)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lines_with_offsets() {
    let lines = lines_with_offsets("a\r\nbb\nc");
    assert_eq!(lines, vec![(0, "a\r\n"), (3, "bb\n"), (6, "c")]);
    assert!(lines_with_offsets("").is_empty());
  }

  #[test]
  fn test_leading_spdx_blocks_stacked() {
    let content = "<!--\nSPDX-License-Identifier: MIT\n-->\n\n<!--\nSPDX-FileCopyrightText: 2020 A\n-->\n<!--\nplain\n-->\n";
    let lines = lines_with_offsets(content);
    let (blocks, next) = leading_spdx_blocks(&lines, "<!--", "-->");
    assert_eq!(
      blocks,
      vec![BlockSpan { open: 0, close: 2 }, BlockSpan { open: 4, close: 6 }]
    );
    assert_eq!(next, 7);
  }

  #[test]
  fn test_leading_spdx_blocks_unclosed() {
    let lines = lines_with_offsets("<!--\nSPDX-License-Identifier: MIT\n<root/>\n");
    let (blocks, next) = leading_spdx_blocks(&lines, "<!--", "-->");
    assert!(blocks.is_empty());
    assert_eq!(next, 0);
  }
}
