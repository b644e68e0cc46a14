#![deny(missing_docs)]
//! Shared logging utilities for the feedpost workspace.
//!
//! The `engine_*` macros forward to the `log` facade with the caller's
//! module as target, so callers need no direct `log` dependency. The
//! bounded [`LogBuffer`] backs the control surface's log view.

mod buffer;

pub use buffer::{BufferLogger, LogBuffer, LOG_BUFFER_CAPACITY};

#[doc(hidden)]
pub use log as __log;

/// Trace-level record.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => { $crate::__log::trace!($($arg)*) };
}

/// Info-level record.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => { $crate::__log::info!($($arg)*) };
}

/// Debug-level record.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => { $crate::__log::debug!($($arg)*) };
}

/// Warn-level record.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => { $crate::__log::warn!($($arg)*) };
}

/// Error-level record.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => { $crate::__log::error!($($arg)*) };
}

/// Installs a terminal logger for tests; later calls are no-ops.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
