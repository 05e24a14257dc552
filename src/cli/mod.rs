//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing.

mod stamp;

use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
pub use stamp::{StampArgs, run_stamp};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # Add or refresh SPDX headers in the given files
  spdxstamp src/main.go src/util.py

  # Check headers without modifying files (exit status 1 if any would change)
  spdxstamp --check --show-diff src/main.go

  # Headers for the files touched by a pull request
  spdxstamp --files-added \"$ADDED\" --files-modified \"$MODIFIED\" \\
    --pr-base-sha \"$BASE\" --pr-head-sha \"$HEAD\" --pr-author octocat

  # Use a license other than the configured default
  spdxstamp --license \"Apache-2.0 OR MIT\" lib/*.rs

  # Write a JSON report of what changed
  spdxstamp --report-json report.json src/*.go
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(flatten)]
  pub stamp_args: StampArgs,
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_pr_range_requires_both_ends() {
    let result = Cli::try_parse_from(["spdxstamp", "--pr-base-sha", "abc", "a.go"]);
    assert!(result.is_err());

    let cli = Cli::try_parse_from(["spdxstamp", "--pr-base-sha", "abc", "--pr-head-sha", "def", "a.go"])
      .expect("both ends parse");
    assert_eq!(cli.stamp_args.pr_base_sha.as_deref(), Some("abc"));
  }

  #[test]
  fn test_file_list_flags_take_multiple_values() {
    let cli = Cli::try_parse_from(["spdxstamp", "--files-added", "a.go b.go", "c.go", "--check"]).expect("parses");
    assert_eq!(cli.stamp_args.files_added, vec!["a.go b.go", "c.go"]);
    assert!(cli.stamp_args.check);
  }
}
