//! # Logging Module
//!
//! Output plumbing for spdxstamp. Two channels are kept apart:
//! - Per-file progress lines ("Added header to: ...") through [`info_log!`]
//!   on stdout and [`verbose_log!`] on stderr, gated by a process-wide mode
//! - Diagnostics through `tracing`, filtered by `RUST_LOG` or the verbosity
//!
//! The stamp command wires both up once at startup: `-q`/`-v` feed
//! [`init_tracing`] and [`set_quiet`]/[`set_verbose`], and `--colors` picks
//! the [`ColorMode`] that [`ColorMode::apply`] installs for the report and
//! summary printers.
//!
//! ## Example
//!
//! ```rust
//! use spdxstamp::logging::{ColorMode, set_verbose};
//! use spdxstamp::{info_log, verbose_log};
//!
//! // Enable verbose logging
//! set_verbose();
//!
//! // Set color mode to Auto (uses owo-colors' automatic TTY detection)
//! ColorMode::Auto.apply();
//!
//! // Log a verbose message (goes to stderr)
//! verbose_log!("Reconciling file: {}", "main.go");
//!
//! // Log an info message (goes to stdout)
//! info_log!("Updated header in: {}", "main.go");
//! ```

mod modes;

pub use modes::{ColorMode, init_tracing, is_quiet, is_verbose, set_quiet, set_verbose};
use owo_colors::{OwoColorize, Stream};

/// Logs a message to stderr if verbose mode is enabled.
///
/// This macro is used for detailed logging that is only shown when verbose mode
/// is enabled via [`set_verbose`]. It uses the same format string syntax as
/// the standard [`eprintln!`] macro.
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)*) => {
        if $crate::logging::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

/// Logs a message to stdout unless quiet mode is enabled.
///
/// This macro is used for important information that should always be displayed
/// to the user. It uses the same format string syntax as the standard
/// [`println!`] macro.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        if !$crate::logging::is_quiet() {
            $crate::logging::print_info_log(&format!($($arg)*));
        }
    };
}

/// Internal function to print info log messages with formatting.
///
/// This function is used by the [`info_log!`] macro to format and print
/// messages with colors if enabled.
pub fn print_info_log(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |m| m.yellow()));
}
