use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use simplelog::{Config, SharedLogger};

/// Number of lines kept by [`LogBuffer::new`].
pub const LOG_BUFFER_CAPACITY: usize = 400;

/// Bounded, append-only log line buffer shared between the worker and the
/// control surface.
///
/// Cloning is cheap; all clones see the same lines. When full, the oldest
/// line is discarded first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBuffer {
    /// Creates a buffer holding at most [`LOG_BUFFER_CAPACITY`] lines.
    pub fn new() -> Self {
        Self::with_capacity(LOG_BUFFER_CAPACITY)
    }

    /// Creates a buffer holding at most `capacity` lines.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends a line, evicting the oldest ones past capacity.
    pub fn push(&self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.guard();
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// Snapshot of the retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.guard().iter().cloned().collect()
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns `true` when no line has been retained.
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `simplelog` sink that renders records as `[timestamp] LEVEL message`
/// into a [`LogBuffer`].
pub struct BufferLogger {
    level: LevelFilter,
    config: Config,
    buffer: LogBuffer,
    target_prefixes: Vec<String>,
}

impl BufferLogger {
    /// Creates a boxed logger accepting records at or above `level`.
    pub fn new(level: LevelFilter, config: Config, buffer: LogBuffer) -> Box<Self> {
        Box::new(Self {
            level,
            config,
            buffer,
            target_prefixes: Vec::new(),
        })
    }

    /// Restricts the logger to records whose target starts with one of
    /// `prefixes`. An empty list accepts every target.
    pub fn with_target_prefixes<I, S>(mut self: Box<Self>, prefixes: I) -> Box<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    fn accepts_target(&self, target: &str) -> bool {
        self.target_prefixes.is_empty()
            || self
                .target_prefixes
                .iter()
                .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

impl Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && self.accepts_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.buffer
            .push(format!("[{timestamp}] {:<5} {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

impl SharedLogger for BufferLogger {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        Some(&self.config)
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}
