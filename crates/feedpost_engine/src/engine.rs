use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn, LogBuffer};
use feedpost_core::{CaptionSettings, RunState, SharedRunState};
use thiserror::Error;

use crate::control_loop::{ControlLoop, LoopConfig, LoopDeps, LoopExit, StopSignal};
use crate::persist::{ensure_dir, PersistError};
use crate::store::{StoreError, UserConfig};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_feed_url: String,
    pub check_interval: Duration,
    pub media_dir: PathBuf,
    pub caption: CaptionSettings,
}

/// Fields submitted with a start or save request; blank fields keep the
/// saved value.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub username: String,
    pub password: String,
    pub rss_url: String,
    pub session_cookie: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    MissingCredentials,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to prepare media directory: {0}")]
    Media(#[from] PersistError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(io::Error),
}

struct Worker {
    stop: StopSignal,
    thread: JoinHandle<LoopExit>,
}

impl Worker {
    fn is_alive(&self) -> bool {
        !self.thread.is_finished()
    }
}

/// Control surface over at most one background worker.
pub struct EngineHandle {
    config: EngineConfig,
    deps: LoopDeps,
    logs: LogBuffer,
    worker: Mutex<Option<Worker>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, deps: LoopDeps, logs: LogBuffer) -> Self {
        Self {
            config,
            deps,
            logs,
            worker: Mutex::new(None),
        }
    }

    /// Merges `request` into the saved configuration, saves it and spawns
    /// the worker unless one is already alive. A running worker keeps its
    /// settings; the saved ones apply from the next start.
    pub fn start(&self, request: StartRequest) -> Result<StartOutcome, EngineError> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        let merged = merge(self.config()?, &request);
        if merged.username.trim().is_empty() || merged.password.is_empty() {
            engine_warn!("Start rejected: username and password are required");
            return Ok(StartOutcome::MissingCredentials);
        }
        self.deps.store.save_config(&merged)?;

        if slot.as_ref().is_some_and(Worker::is_alive) {
            engine_info!("Start ignored: worker already running");
            return Ok(StartOutcome::AlreadyRunning);
        }
        ensure_dir(&self.config.media_dir)?;

        let loop_config = LoopConfig {
            feed_url: merged.rss_url.clone(),
            credentials: merged.credentials(),
            check_interval: self.config.check_interval,
            media_dir: self.config.media_dir.clone(),
            caption: self.config.caption.clone(),
        };
        let stop = StopSignal::new();
        let control = ControlLoop::new(loop_config, self.deps.clone(), stop.clone());
        // Visible to status readers before the thread gets scheduled.
        self.deps.run_state.update(RunState::begin);

        let run_state = self.deps.run_state.clone();
        let spawned = thread::Builder::new()
            .name("feedpost-worker".to_string())
            .spawn(move || run_worker(control, run_state));
        let thread = match spawned {
            Ok(thread) => thread,
            Err(err) => {
                self.deps.run_state.update(RunState::finish);
                return Err(EngineError::Spawn(err));
            }
        };

        *slot = Some(Worker { stop, thread });
        engine_info!("Worker spawned");
        Ok(StartOutcome::Started)
    }

    /// Signals the worker to stop; returns without waiting for it.
    pub fn stop(&self) {
        let slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(worker) if worker.is_alive() => {
                worker.stop.stop();
                engine_info!("Stop requested");
            }
            _ => engine_info!("Stop requested while no worker is running"),
        }
    }

    /// Waits for the current worker, if any, to exit.
    pub fn join(&self) -> Option<LoopExit> {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        match worker.thread.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                engine_warn!("Worker thread panicked");
                self.deps.run_state.update(RunState::finish);
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Worker::is_alive)
    }

    pub fn metrics(&self) -> RunState {
        self.deps.run_state.snapshot()
    }

    pub fn recent_logs(&self) -> Vec<String> {
        self.logs.lines()
    }

    pub fn config(&self) -> Result<UserConfig, EngineError> {
        Ok(self.deps.store.load_config(&self.config.default_feed_url)?)
    }

    /// Persists the submitted configuration without starting the worker.
    pub fn save_config(&self, request: StartRequest) -> Result<UserConfig, EngineError> {
        let mut config = UserConfig {
            rss_url: request.rss_url.trim().to_string(),
            username: request.username.trim().to_string(),
            password: request.password,
            session_cookie: request.session_cookie.trim().to_string(),
        };
        if config.rss_url.is_empty() {
            config.rss_url = self.config.default_feed_url.clone();
        }
        self.deps.store.save_config(&config)?;
        Ok(config)
    }
}

fn merge(saved: UserConfig, request: &StartRequest) -> UserConfig {
    fn pick(submitted: &str, saved: String) -> String {
        let submitted = submitted.trim();
        if submitted.is_empty() {
            saved
        } else {
            submitted.to_string()
        }
    }

    UserConfig {
        rss_url: pick(&request.rss_url, saved.rss_url),
        username: pick(&request.username, saved.username),
        password: if request.password.is_empty() {
            saved.password
        } else {
            request.password.clone()
        },
        session_cookie: pick(&request.session_cookie, saved.session_cookie),
    }
}

fn run_worker(control: ControlLoop, run_state: SharedRunState) -> LoopExit {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            engine_warn!("Failed to build worker runtime: {}", err);
            run_state.update(|state| {
                state.record_error(err.to_string());
                state.finish();
            });
            return LoopExit::Stopped;
        }
    };
    runtime.block_on(control.run())
}
