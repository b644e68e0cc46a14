use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use feedpost_core::{Credentials, DeviceIdentity, LoginStrategy, SessionBlob};
use thiserror::Error;

use crate::platform::{PlatformClient, PlatformError, PlatformFailure};
use crate::store::StateStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no usable login method: {0}")]
    Config(String),
    #[error("two-factor authentication required: {0}")]
    TwoFactorRequired(String),
    #[error("challenge required: {0}")]
    ChallengeRequired(String),
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error("publish attempted before login")]
    NotAuthenticated,
    #[error("device identity unavailable: {0}")]
    DeviceIdentity(String),
}

impl AuthError {
    /// Verification demands that no retry can satisfy.
    pub fn needs_operator(&self) -> bool {
        matches!(
            self,
            AuthError::TwoFactorRequired(_) | AuthError::ChallengeRequired(_)
        )
    }
}

impl From<PlatformError> for AuthError {
    fn from(err: PlatformError) -> Self {
        match err.kind {
            PlatformFailure::TwoFactorRequired => AuthError::TwoFactorRequired(err.message),
            PlatformFailure::ChallengeRequired => AuthError::ChallengeRequired(err.message),
            _ => AuthError::Rejected(err.to_string()),
        }
    }
}

/// Owns the platform session for one worker run.
pub struct SessionManager {
    client: Arc<dyn PlatformClient>,
    store: StateStore,
    device: DeviceIdentity,
    session: Option<SessionBlob>,
}

impl SessionManager {
    /// Loads the device identity, generating and persisting it on first use.
    pub fn new(client: Arc<dyn PlatformClient>, store: StateStore) -> Result<Self, AuthError> {
        let device = match store.load_device() {
            Ok(Some(device)) => device,
            Ok(None) => {
                let device = DeviceIdentity::generate();
                store
                    .save_device(&device)
                    .map_err(|err| AuthError::DeviceIdentity(err.to_string()))?;
                engine_info!("Generated new device identity {}", device.device_id);
                device
            }
            Err(err) => return Err(AuthError::DeviceIdentity(err.to_string())),
        };

        Ok(Self {
            client,
            store,
            device,
            session: None,
        })
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Tries the configured strategies in priority order and stops at the
    /// first that yields a live session.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), AuthError> {
        let mut last_rejection = None;

        for strategy in credentials.login_strategies() {
            let authenticated = match strategy {
                LoginStrategy::PersistedSession => self.restore_from_persisted_session().await,
                LoginStrategy::SessionCookie => {
                    let cookie = credentials.session_cookie().unwrap_or_default();
                    self.login_with_session_cookie(cookie).await
                }
                LoginStrategy::Credentials => {
                    let username = credentials.username().unwrap_or_default();
                    let password = credentials.password().unwrap_or_default();
                    match self.login_with_credentials(username, password).await {
                        Ok(()) => true,
                        Err(err) if err.needs_operator() => return Err(err),
                        Err(err) => {
                            engine_warn!("Credential login failed: {}", err);
                            last_rejection = Some(err.to_string());
                            false
                        }
                    }
                }
            };

            if authenticated {
                engine_info!("Authenticated via {}", strategy);
                return Ok(());
            }
        }

        if !credentials.is_usable() {
            return Err(AuthError::Config(
                "configure a session cookie or a username and password".to_string(),
            ));
        }
        Err(AuthError::Config(match last_rejection {
            Some(reason) => format!("all login methods failed, last: {reason}"),
            None => "all login methods failed".to_string(),
        }))
    }

    /// Probes the persisted session; a rejected or unreadable one is deleted
    /// so later runs do not keep retrying it.
    pub async fn restore_from_persisted_session(&mut self) -> bool {
        let session = match self.store.load_session() {
            Ok(Some(session)) => session,
            Ok(None) => return false,
            Err(err) => {
                engine_warn!("Persisted session unreadable ({}); discarding it", err);
                self.discard_persisted_session();
                return false;
            }
        };

        match self.client.probe(&session).await {
            Ok(()) => {
                engine_info!("Restored persisted session");
                self.session = Some(session);
                true
            }
            Err(err) => {
                engine_warn!("Persisted session rejected ({}); discarding it", err);
                self.discard_persisted_session();
                false
            }
        }
    }

    pub async fn login_with_session_cookie(&mut self, cookie: &str) -> bool {
        let cookie = cookie.trim();
        if cookie.is_empty() {
            return false;
        }

        let session = self.client.session_from_cookie(cookie, &self.device);
        match self.client.probe(&session).await {
            Ok(()) => {
                self.adopt(session);
                true
            }
            Err(err) => {
                engine_warn!("Session cookie rejected: {}", err);
                false
            }
        }
    }

    /// Full login; the most likely path to trip platform risk checks.
    pub async fn login_with_credentials(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Config(
                "username and password are both required".to_string(),
            ));
        }

        engine_info!("Logging in as {}", username.trim());
        let session = self
            .client
            .login(username.trim(), password, &self.device)
            .await?;
        self.adopt(session);
        engine_info!("Login completed");
        Ok(())
    }

    pub fn ensure_authenticated(&self) -> Result<&SessionBlob, AuthError> {
        self.session.as_ref().ok_or(AuthError::NotAuthenticated)
    }

    /// Replaces the active session after the platform rotated it.
    pub fn store_refreshed_session(&mut self, session: SessionBlob) {
        self.adopt(session);
    }

    fn adopt(&mut self, session: SessionBlob) {
        if let Err(err) = self.store.save_session(&session) {
            engine_warn!("Could not persist session: {}", err);
        }
        self.session = Some(session);
    }

    fn discard_persisted_session(&mut self) {
        self.session = None;
        if let Err(err) = self.store.clear_session() {
            engine_warn!("Could not delete persisted session: {}", err);
        }
    }
}
