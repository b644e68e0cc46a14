//! JSON-over-HTTP adapter for a platform bridge service.
//!
//! The bridge wraps the actual platform library; this client only moves
//! session blobs, credentials and media across the wire.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use engine_logging::engine_debug;
use feedpost_core::{DeviceIdentity, SessionBlob};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::platform::{PlatformClient, PlatformError, PlatformFailure};

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session: SessionBlob,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpPlatformClient {
    pub fn new(base_url: &str, settings: BridgeSettings) -> Result<Self, PlatformError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| PlatformError::new(PlatformFailure::Other, err.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| PlatformError::new(PlatformFailure::Network, err.to_string()))?;
        Ok(Self { base_url, http })
    }

    async fn post(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, PlatformError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|err| PlatformError::new(PlatformFailure::Other, err.to_string()))?;
        engine_debug!("bridge POST {}", url);

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| PlatformError::new(PlatformFailure::Network, err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(map_error_body(status.as_u16(), &text))
    }

    async fn post_for_session(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<SessionBlob, PlatformError> {
        let response = self.post(endpoint, body).await?;
        let parsed: SessionResponse = response
            .json()
            .await
            .map_err(|err| PlatformError::new(PlatformFailure::Other, err.to_string()))?;
        Ok(parsed.session)
    }
}

#[async_trait::async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn login(
        &self,
        username: &str,
        password: &str,
        device: &DeviceIdentity,
    ) -> Result<SessionBlob, PlatformError> {
        self.post_for_session(
            "login",
            json!({ "username": username, "password": password, "device": device }),
        )
        .await
    }

    fn session_from_cookie(&self, cookie: &str, device: &DeviceIdentity) -> SessionBlob {
        SessionBlob::new(json!({
            "cookies": { "sessionid": cookie },
            "device": device,
        }))
    }

    async fn probe(&self, session: &SessionBlob) -> Result<(), PlatformError> {
        self.post("session/probe", json!({ "session": session }))
            .await
            .map(|_| ())
    }

    async fn upload_photo(
        &self,
        session: &SessionBlob,
        media: &Path,
        caption: &str,
    ) -> Result<SessionBlob, PlatformError> {
        let bytes = tokio::fs::read(media).await.map_err(|err| {
            PlatformError::new(
                PlatformFailure::Other,
                format!("cannot read {}: {err}", media.display()),
            )
        })?;
        self.post_for_session(
            "media/photo",
            json!({
                "session": session,
                "caption": caption,
                "image_base64": STANDARD.encode(bytes),
            }),
        )
        .await
    }
}

fn map_error_body(status: u16, body: &str) -> PlatformError {
    let parsed: Option<ErrorResponse> = serde_json::from_str(body).ok();
    let (error_type, message) = match parsed {
        Some(err) => (err.error_type, err.message),
        None => (String::new(), body.trim().to_string()),
    };
    let message = if message.is_empty() {
        format!("bridge returned HTTP {status}")
    } else {
        message
    };

    let kind = match error_type.as_str() {
        "two_factor_required" => PlatformFailure::TwoFactorRequired,
        "challenge_required" => PlatformFailure::ChallengeRequired,
        "login_required" => PlatformFailure::LoginRequired,
        "bad_credentials" => PlatformFailure::BadCredentials,
        _ if status == 401 => PlatformFailure::LoginRequired,
        _ => PlatformFailure::Other,
    };
    PlatformError::new(kind, message)
}

#[cfg(test)]
mod tests {
    use super::map_error_body;
    use crate::platform::PlatformFailure;

    #[test]
    fn error_types_map_to_failures() {
        let err = map_error_body(400, r#"{"error_type":"challenge_required","message":"verify"}"#);
        assert_eq!(err.kind, PlatformFailure::ChallengeRequired);
        assert_eq!(err.message, "verify");

        let err = map_error_body(401, "");
        assert_eq!(err.kind, PlatformFailure::LoginRequired);
        assert_eq!(err.message, "bridge returned HTTP 401");

        let err = map_error_body(500, "boom");
        assert_eq!(err.kind, PlatformFailure::Other);
        assert_eq!(err.message, "boom");
    }
}
