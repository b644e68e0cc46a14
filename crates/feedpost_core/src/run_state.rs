use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::LoopPhase;

/// Worker status as seen by the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunState {
    pub running: bool,
    pub phase: LoopPhase,
    pub last_title: Option<String>,
    pub last_link: Option<String>,
    pub last_published_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub posts_count: u64,
}

impl RunState {
    pub fn begin(&mut self) {
        self.running = true;
        self.phase = LoopPhase::LoggingIn;
    }

    pub fn record_published(&mut self, title: &str, link: &str, at: DateTime<Utc>) {
        self.last_title = Some(title.to_string());
        self.last_link = Some(link.to_string());
        self.last_published_at = Some(at);
        self.last_error = None;
        self.posts_count += 1;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn finish(&mut self) {
        self.running = false;
        self.phase = LoopPhase::Stopped;
    }
}

/// Lock-guarded [`RunState`] shared by the worker (writer) and the control
/// surface (reader).
#[derive(Debug, Clone, Default)]
pub struct SharedRunState {
    inner: Arc<Mutex<RunState>>,
}

impl SharedRunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RunState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update<R>(&self, apply: impl FnOnce(&mut RunState) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard)
    }

    pub fn set_phase(&self, phase: LoopPhase) {
        self.update(|state| state.phase = phase);
    }
}
