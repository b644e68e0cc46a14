use std::path::Path;
use std::sync::Arc;

use engine_logging::engine_info;
use feedpost_core::PublishOutcome;
use thiserror::Error;

use crate::platform::{PlatformClient, PlatformError, PlatformFailure};
use crate::session::SessionManager;

/// Lowercase fragments of platform messages that mean the session artifact
/// was rejected mid-request.
const TOKEN_INVALIDATION_PATTERNS: &[&str] = &[
    "login_required",
    "csrf",
    "invalid token",
    "token is invalid",
    "token expired",
    "session expired",
    "oauth",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("session rejected mid-request: {0}")]
    RecoverableAuth(String),
    #[error("publish failed: {0}")]
    Failed(String),
    #[error("publish attempted before login")]
    NotAuthenticated,
}

impl PublishError {
    pub fn outcome(&self) -> PublishOutcome {
        match self {
            PublishError::RecoverableAuth(_) => PublishOutcome::RecoverableAuth,
            PublishError::Failed(_) | PublishError::NotAuthenticated => PublishOutcome::Failed,
        }
    }
}

pub fn is_token_invalidation(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TOKEN_INVALIDATION_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

fn classify(err: PlatformError) -> PublishError {
    if err.kind == PlatformFailure::LoginRequired || is_token_invalidation(&err.message) {
        PublishError::RecoverableAuth(err.to_string())
    } else {
        PublishError::Failed(err.to_string())
    }
}

/// Performs exactly one upload per call.
pub struct Publisher {
    client: Arc<dyn PlatformClient>,
}

impl Publisher {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self { client }
    }

    pub async fn publish(
        &self,
        session: &mut SessionManager,
        media: &Path,
        caption: &str,
    ) -> Result<(), PublishError> {
        let active = session
            .ensure_authenticated()
            .map_err(|_| PublishError::NotAuthenticated)?;

        engine_info!("Uploading post");
        let refreshed = self
            .client
            .upload_photo(active, media, caption)
            .await
            .map_err(classify)?;
        session.store_refreshed_session(refreshed);
        engine_info!("Post published");
        Ok(())
    }
}
