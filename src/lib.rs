//! # spdxstamp
//!
//! Keeps SPDX copyright and license headers in source files in sync with each
//! file's git contribution history and a per-path license policy.
//!
//! For every file, `spdxstamp` reads any existing header, merges its authors
//! with the authors found in the file's commit history (and optionally a pull
//! request author), decides the file's license from path rules, and rewrites
//! the header in the file's comment syntax:
//!
//! ```text
//! // SPDX-FileCopyrightText: 2025 Ada <ada@example.com>
//! //
//! // SPDX-License-Identifier: MIT
//! ```
//!
//! Rewriting is idempotent: running twice with the same history changes nothing
//! the second time.
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use spdxstamp::config::Policy;
//! use spdxstamp::git::GitHistory;
//! use spdxstamp::processor::{PrContext, Reconciler, ReconcilerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let root = PathBuf::from(".");
//!   let history = GitHistory::discover(&root)?;
//!   let reconciler = Reconciler::new(ReconcilerConfig::new(root, Policy::new(2025)), Box::new(history));
//!
//!   let license = reconciler.default_expression();
//!   let batch = reconciler
//!     .process_files(&[PathBuf::from("src/main.go")], &license, &PrContext::default())
//!     .await;
//!   println!("changed: {}", batch.any_changed);
//!   Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`processor`] - The per-file reconciliation driver
//! * [`header`] - Parsing, stripping and rendering SPDX header blocks
//! * [`contributors`] - Author sets, identity filters and aggregation
//! * [`license`] - License label resolution and per-path rules
//! * [`git`] - Contribution history from a git repository

pub mod comment_style;
pub mod config;
pub mod contributors;
pub mod diff;
pub mod git;
pub mod header;
pub mod history;
pub mod license;
pub mod license_map;
pub mod logging;
pub mod output;
pub mod processor;
pub mod report;
