use std::fmt;
use std::path::Path;

use feedpost_core::{DeviceIdentity, SessionBlob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFailure {
    /// Out-of-band second factor needed; an operator has to intervene.
    TwoFactorRequired,
    /// Platform asked for a verification challenge; an operator has to intervene.
    ChallengeRequired,
    /// The session artifact is no longer accepted.
    LoginRequired,
    BadCredentials,
    Network,
    Other,
}

impl fmt::Display for PlatformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformFailure::TwoFactorRequired => write!(f, "two-factor authentication required"),
            PlatformFailure::ChallengeRequired => write!(f, "challenge required"),
            PlatformFailure::LoginRequired => write!(f, "login required"),
            PlatformFailure::BadCredentials => write!(f, "bad credentials"),
            PlatformFailure::Network => write!(f, "network error"),
            PlatformFailure::Other => write!(f, "platform error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PlatformError {
    pub kind: PlatformFailure,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: PlatformFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything the engine needs from the social platform.
#[async_trait::async_trait]
pub trait PlatformClient: Send + Sync {
    /// Full login; never reuses a previous session.
    async fn login(
        &self,
        username: &str,
        password: &str,
        device: &DeviceIdentity,
    ) -> Result<SessionBlob, PlatformError>;

    /// Wraps a browser session cookie so it can be probed and persisted.
    fn session_from_cookie(&self, cookie: &str, device: &DeviceIdentity) -> SessionBlob;

    /// Cheapest authenticated call; succeeds only for a live session.
    async fn probe(&self, session: &SessionBlob) -> Result<(), PlatformError>;

    /// Publishes one photo. Returns the session as rotated by the platform.
    async fn upload_photo(
        &self,
        session: &SessionBlob,
        media: &Path,
        caption: &str,
    ) -> Result<SessionBlob, PlatformError>;
}
