//! Logging utilities with colored output and verbosity levels.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `vlog!` / `vvlog!` for messages shown only at higher verbosity
//!
//! # Example
//!
//! ```ignore
//! // Always shown (unless quiet)
//! log!("build"; "loaded {} items", count);
//!
//! // Phase progress, shown with `Verbosity::Verbose`
//! vlog!("pipeline"; "generators processed");
//!
//! // Per-item detail, shown with `Verbosity::VeryVerbose`
//! vvlog!("convert"; "item `{}`", id);
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        OnceLock,
        atomic::{AtomicU8, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Current verbosity, stored as the enum discriminant.
static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

// ============================================================================
// Verbosity
// ============================================================================

/// How chatty the build output is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Verbosity {
    /// Nothing is printed.
    Quiet = 0,
    /// Warnings and final results.
    Normal = 1,
    /// Phase-level progress.
    Verbose = 2,
    /// Per-item detail.
    VeryVerbose = 3,
}

impl Verbosity {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Quiet,
            1 => Self::Normal,
            2 => Self::Verbose,
            _ => Self::VeryVerbose,
        }
    }
}

/// Set the process-wide verbosity.
pub fn set_verbosity(verbosity: Verbosity) {
    VERBOSITY.store(verbosity as u8, Ordering::Relaxed);
}

/// Get the process-wide verbosity.
pub fn verbosity() -> Verbosity {
    Verbosity::from_u8(VERBOSITY.load(Ordering::Relaxed))
}

/// Whether a message at `level` should be printed.
#[inline]
pub fn enabled(level: Verbosity) -> bool {
    level != Verbosity::Quiet && level <= verbosity()
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log_at($crate::logger::Verbosity::Normal, $module, || format!($($arg)*))
    }};
}

/// Log a message shown only in verbose mode.
#[macro_export]
macro_rules! vlog {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log_at($crate::logger::Verbosity::Verbose, $module, || format!($($arg)*))
    }};
}

/// Log a message shown only in very verbose mode.
#[macro_export]
macro_rules! vvlog {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log_at($crate::logger::Verbosity::VeryVerbose, $module, || format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for "[", "]", and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// Log a lazily formatted message if `level` is enabled.
#[inline]
pub fn log_at(level: Verbosity, module: &str, message: impl FnOnce() -> String) {
    if enabled(level) {
        log(module, &message());
    }
}

/// Log a message with a colored module prefix.
///
/// Automatically truncates long messages to fit terminal width.
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
    let message = truncate_str(message, max_msg_len);

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "warn" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        "plugin" => prefix.bright_blue().bold(),
        "write" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within max_len bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
