//! FILENAME: core/engine/src/logging.rs
// PURPOSE: Category-tagged logging shared by the engine crates.

use log::Level;

// ============================================================================
// LINE FORMAT
// ============================================================================

/// Target every engine log line is emitted under.
pub const LOG_TARGET: &str = "tally";

/// Maps the single-letter level codes used by the macros onto `log` levels.
/// Unknown codes log at info.
pub fn parse_level(code: &str) -> Level {
    match code {
        "E" => Level::Error,
        "W" => Level::Warn,
        "D" => Level::Debug,
        "T" => Level::Trace,
        _ => Level::Info,
    }
}

/// Builds a log line in unified format: `level|category|message`.
pub fn format_line(level: &str, category: &str, message: &str) -> String {
    format!("{}|{}|{}", level, category, message)
}

/// Write a log line in unified format through the `log` facade.
pub fn write_log(level: &str, category: &str, message: &str) {
    log::log!(target: LOG_TARGET, parse_level(level), "{}", format_line(level, category, message));
}

/// Write an ENTER log line for function entry
pub fn write_log_enter(level: &str, category: &str, func_name: &str, params: &str) {
    let message = if params.is_empty() {
        format!("ENTER {}", func_name)
    } else {
        format!("ENTER {} {}", func_name, params)
    };
    write_log(level, category, &message);
}

/// Write an EXIT log line for function exit
pub fn write_log_exit(level: &str, category: &str, func_name: &str, result: &str) {
    let message = if result.is_empty() {
        format!("EXIT {}", func_name)
    } else {
        format!("EXIT {} {}", func_name, result)
    };
    write_log(level, category, &message);
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("D", $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("I", $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("W", $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("E", $cat, &format!($($arg)*))
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_enter("D", $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_enter("D", $cat, $func, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_exit("D", $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_exit("D", $cat, $func, &format!($($arg)*))
    };
}

// Re-export the macros so they can be imported via `use engine::logging::log_info;`
pub use log_debug;
pub use log_info;
pub use log_warn;
pub use log_error;
pub use log_enter;
pub use log_exit;
