//! Logging utilities with colored terminal output.
//!
//! Provides the `log!` macro for formatted output with colored `[module]`
//! prefixes.
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "converting {} files", count);
//! ```

use colored::{ColoredString, Colorize};
use std::io::{Write, stderr};

/// Length of brackets around module name: "[]" plus trailing space
const PREFIX_OVERHEAD: usize = 3;

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Multiline messages keep the prefix on the first line only.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Calculate total prefix length for a module name.
#[inline]
#[allow(dead_code)]
pub const fn prefix_len(module_len: usize) -> usize {
    module_len + PREFIX_OVERHEAD
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

// ============================================================================
// Tests
// ============================================================================
