//! Logger setup: terminal, optional log file, and the in-memory buffer
//! served by `GET /logs`.

use std::fs::{File, OpenOptions};
use std::path::Path;

use engine_logging::{BufferLogger, LogBuffer};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Only records from the workspace crates reach the operator buffer.
const BUFFERED_TARGET_PREFIX: &str = "feedpost";

/// Where terminal-style log output goes besides the buffer.
pub enum LogDestination<'a> {
    Terminal,
    /// Terminal plus an appended log file.
    Both(&'a Path),
}

/// Installs the global logger and returns the buffer it feeds.
pub fn initialize(destination: LogDestination<'_>) -> LogBuffer {
    let level = LevelFilter::Info;
    let config = build_config();
    let buffer = LogBuffer::new();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        BufferLogger::new(level, config.clone(), buffer.clone())
            .with_target_prefixes([BUFFERED_TARGET_PREFIX]),
    ];
    if let LogDestination::Both(path) = destination {
        if let Some(file_logger) = create_file_logger(path, level, config) {
            loggers.push(file_logger);
        }
    }

    let _ = CombinedLogger::init(loggers);
    buffer
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not open log file at {:?}: {}", path, err);
            None
        }
    }
}
