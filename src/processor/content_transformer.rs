//! # Content Transformer Module
//!
//! Splits a file into the preamble that must stay on top and the body the
//! header is placed above, and puts the pieces back together.

use crate::comment_style::CommentStyle;

/// A file's content split around where the header belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitContent<'a> {
  /// A declaration that must remain the first thing in the file: an XML
  /// declaration or DOCTYPE for block comment styles, a shebang line for
  /// single-line comment styles.
  pub preamble: Option<&'a str>,
  /// Everything after the preamble, without leading blank lines.
  pub body: &'a str,
}

/// Separates the preamble (if any) from the rest of `content`.
pub fn split_preamble<'a>(content: &'a str, style: &CommentStyle) -> SplitContent<'a> {
  let preamble_end = if style.is_block() {
    markup_declaration_end(content)
  } else {
    shebang_end(content)
  };

  match preamble_end {
    Some((start, end)) => SplitContent {
      preamble: Some(&content[start..end]),
      body: skip_blank_lines(&content[end..]),
    },
    None => SplitContent {
      preamble: None,
      body: skip_blank_lines(content),
    },
  }
}

/// Byte range of a leading `<?xml ... ?>` or `<!DOCTYPE ...>` declaration.
fn markup_declaration_end(content: &str) -> Option<(usize, usize)> {
  let start = content.len() - content.trim_start().len();
  let rest = &content[start..];

  if rest.starts_with("<?xml") {
    return rest.find("?>").map(|end| (start, start + end + 2));
  }

  let is_doctype = rest
    .get(..9)
    .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
  if is_doctype {
    return rest.find('>').map(|end| (start, start + end + 1));
  }

  None
}

/// Byte range of a leading `#!/...` interpreter line, without its newline.
fn shebang_end(content: &str) -> Option<(usize, usize)> {
  if !(content.starts_with("#!/") || content.starts_with("#! /")) {
    return None;
  }
  let end = content.find('\n').unwrap_or(content.len());
  let end = if content[..end].ends_with('\r') { end - 1 } else { end };
  Some((0, end))
}

/// Drops whole lines that are empty or whitespace from the start of `text`.
pub fn skip_blank_lines(text: &str) -> &str {
  let mut rest = text;
  loop {
    let line_end = rest.find('\n').map_or(rest.len(), |i| i + 1);
    let line = &rest[..line_end];
    if line.is_empty() || !line.trim().is_empty() {
      return rest;
    }
    rest = &rest[line_end..];
  }
}

/// Assembles the final file content.
///
/// The header is separated from a non-empty body by one blank line; an empty
/// body leaves just the header and a newline.
pub fn compose(preamble: Option<&str>, header: &str, body: &str) -> String {
  let body = skip_blank_lines(body);
  let mut out = String::with_capacity(preamble.map_or(0, str::len) + header.len() + body.len() + 3);

  if let Some(preamble) = preamble {
    out.push_str(preamble);
    out.push('\n');
  }

  out.push_str(header);
  if body.trim().is_empty() {
    out.push('\n');
  } else {
    out.push_str("\n\n");
    out.push_str(body);
  }

  out
}
