use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use feedpost_core::{
    compose_caption, poll_decision, truncate_excerpt, CaptionSettings, Credentials, LoopPhase,
    PollDecision, PublishAttempt, PublishOutcome, PublishStep, RunState, SharedRunState,
    EXCERPT_MAX_CHARS,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::extract::clean_text;
use crate::platform::PlatformClient;
use crate::publisher::{PublishError, Publisher};
use crate::session::{AuthError, SessionManager};
use crate::source::{ContentSource, SourceError};
use crate::store::{StateStore, StoreError};

const LATEST_IMAGE: &str = "latest.jpg";

/// Cooperative cancellation shared by the control surface and one worker.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Sleeps for `interval` unless stopped first. Returns `true` when stopped.
    pub async fn sleep(&self, interval: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => true,
            _ = tokio::time::sleep(interval) => self.is_stopped(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub feed_url: String,
    pub credentials: Credentials,
    pub check_interval: Duration,
    /// Transient storage for the image being published.
    pub media_dir: PathBuf,
    pub caption: CaptionSettings,
}

/// Collaborators shared by every worker run.
#[derive(Clone)]
pub struct LoopDeps {
    pub source: Arc<dyn ContentSource>,
    pub platform: Arc<dyn PlatformClient>,
    pub store: StateStore,
    pub run_state: SharedRunState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    EmptyFeed,
    IncompleteEntry,
    NothingNew,
    Published { id: String },
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("feed unavailable: {0}")]
    Feed(SourceError),
    #[error("no lead image found for {0}")]
    NoLeadImage(String),
    #[error("image download failed: {0}")]
    Download(SourceError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("session reset failed: {0}")]
    Recovery(AuthError),
    #[error("state store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    LoginFailed(AuthError),
}

/// One worker run: log in once, then poll/act/sleep until stopped.
pub struct ControlLoop {
    config: LoopConfig,
    deps: LoopDeps,
    publisher: Publisher,
    stop: StopSignal,
    session: Option<SessionManager>,
}

impl ControlLoop {
    pub fn new(config: LoopConfig, deps: LoopDeps, stop: StopSignal) -> Self {
        let publisher = Publisher::new(deps.platform.clone());
        Self {
            config,
            deps,
            publisher,
            stop,
            session: None,
        }
    }

    pub async fn run(mut self) -> LoopExit {
        self.deps.run_state.update(RunState::begin);
        engine_info!("Worker started for feed {}", self.config.feed_url);

        let exit = match self.log_in().await {
            Ok(()) => {
                self.poll_until_stopped().await;
                LoopExit::Stopped
            }
            Err(err) => {
                engine_error!("Login failed: {}", err);
                self.deps.run_state.update(|state| state.record_error(err.to_string()));
                LoopExit::LoginFailed(err)
            }
        };

        self.deps.run_state.update(RunState::finish);
        engine_info!("Worker stopped");
        exit
    }

    /// Runs the login chain once; required before [`ControlLoop::run_cycle`].
    pub async fn log_in(&mut self) -> Result<(), AuthError> {
        self.deps.run_state.set_phase(LoopPhase::LoggingIn);
        let mut manager = SessionManager::new(self.deps.platform.clone(), self.deps.store.clone())?;
        manager.login(&self.config.credentials).await?;
        self.session = Some(manager);
        Ok(())
    }

    async fn poll_until_stopped(&mut self) {
        while !self.stop.is_stopped() {
            match self.run_cycle().await {
                Ok(outcome) => engine_debug!("Cycle finished: {:?}", outcome),
                Err(err) => {
                    engine_error!("Cycle failed: {}", err);
                    self.deps.run_state.update(|state| state.record_error(err.to_string()));
                }
            }
            self.deps.run_state.set_phase(LoopPhase::Polling);
            if self.stop.sleep(self.config.check_interval).await {
                break;
            }
        }
    }

    /// One poll, fetch, publish and record pass.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        self.deps.run_state.set_phase(LoopPhase::Polling);
        let latest = self
            .deps
            .source
            .latest_entry(&self.config.feed_url)
            .await
            .map_err(CycleError::Feed)?;
        let last_published = self.deps.store.last_published()?;

        let entry = match poll_decision(latest.as_ref(), &last_published) {
            PollDecision::EmptyFeed => {
                engine_warn!("No entries in feed");
                return Ok(CycleOutcome::EmptyFeed);
            }
            PollDecision::IncompleteEntry => {
                engine_warn!("Newest feed entry lacks a link or a title");
                return Ok(CycleOutcome::IncompleteEntry);
            }
            PollDecision::AlreadyPublished => {
                engine_info!("No new article");
                return Ok(CycleOutcome::NothingNew);
            }
            PollDecision::New(entry) => entry.clone(),
        };

        self.deps.run_state.set_phase(LoopPhase::Fetching);
        let article = self.deps.source.article(&entry.id).await;
        let image_url = article
            .image_url
            .ok_or_else(|| CycleError::NoLeadImage(entry.id.clone()))?;
        let excerpt = if article.body.is_empty() {
            truncate_excerpt(&clean_text(&entry.summary), EXCERPT_MAX_CHARS)
        } else {
            article.body
        };
        engine_info!("Extracted {} characters of body text", excerpt.chars().count());
        let caption = compose_caption(&entry.title, &excerpt, &self.config.caption);

        self.deps.run_state.set_phase(LoopPhase::Publishing);
        let media = self.config.media_dir.join(LATEST_IMAGE);
        self.deps
            .source
            .download_image(&image_url, &media)
            .await
            .map_err(CycleError::Download)?;
        engine_info!("Publishing: {}", entry.title);
        self.publish_with_recovery(&media, &caption).await?;

        self.deps.run_state.set_phase(LoopPhase::Recording);
        self.deps.store.set_last_published(&entry.id)?;
        self.deps
            .run_state
            .update(|state| state.record_published(&entry.title, &entry.id, Utc::now()));
        Ok(CycleOutcome::Published { id: entry.id })
    }

    async fn publish_with_recovery(&mut self, media: &Path, caption: &str) -> Result<(), CycleError> {
        if self.session.is_none() {
            engine_warn!("No session left from an earlier recovery; logging in again");
            self.reset_session().await?;
        }

        let mut attempt = PublishAttempt::First;
        loop {
            let session = self.session.as_mut().ok_or(PublishError::NotAuthenticated)?;
            let result = self.publisher.publish(session, media, caption).await;
            let outcome = match &result {
                Ok(()) => PublishOutcome::Published,
                Err(err) => err.outcome(),
            };

            match attempt.next_step(outcome) {
                PublishStep::Record => return Ok(()),
                PublishStep::GiveUp => return result.map_err(CycleError::from),
                PublishStep::Recover => {
                    engine_warn!("Session rejected while publishing; logging in again");
                    self.deps.run_state.set_phase(LoopPhase::Recovering);
                    self.reset_session().await?;
                    self.deps.run_state.set_phase(LoopPhase::Publishing);
                    attempt = PublishAttempt::Retry;
                }
            }
        }
    }

    /// Drops the rejected session and forces a credential login through a
    /// fresh manager.
    async fn reset_session(&mut self) -> Result<(), CycleError> {
        self.session = None;
        self.deps.store.clear_session()?;

        let mut fresh = SessionManager::new(self.deps.platform.clone(), self.deps.store.clone())
            .map_err(CycleError::Recovery)?;
        let credentials = &self.config.credentials;
        fresh
            .login_with_credentials(
                credentials.username().unwrap_or_default(),
                credentials.password().unwrap_or_default(),
            )
            .await
            .map_err(CycleError::Recovery)?;
        self.session = Some(fresh);
        Ok(())
    }
}
