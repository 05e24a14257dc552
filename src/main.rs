//! # spdxstamp
//!
//! Keeps SPDX copyright and license headers in sync with git history.

mod cli;

use std::process::ExitCode;

use crate::cli::{Cli, run_stamp};

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse_args();

  match run_stamp(cli.stamp_args).await {
    Ok(code) => code,
    Err(e) => {
      eprintln!("ERROR: {e:#}");
      ExitCode::from(2)
    }
  }
}
