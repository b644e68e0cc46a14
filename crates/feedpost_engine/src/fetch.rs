use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Response;

use crate::types::strip_parameters;
use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

/// Some publishers answer non-browser agents with an error page.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Accepted `Content-Type` values; `type/*` matches a whole family and an
    /// empty list accepts anything.
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::for_page()
    }
}

impl FetchSettings {
    pub fn for_page() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(25),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    /// Feeds are served under too many content types to be worth filtering.
    pub fn for_feed() -> Self {
        Self {
            allowed_content_types: Vec::new(),
            ..Self::for_page()
        }
    }

    /// Object stores and CDNs often label images as generic binary data.
    pub fn for_image() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_bytes: 20 * 1024 * 1024,
            allowed_content_types: vec![
                "image/*".to_string(),
                "application/octet-stream".to_string(),
                "binary/octet-stream".to_string(),
            ],
            ..Self::for_page()
        }
    }

    fn accepts(&self, content_type: &str) -> bool {
        let mime = strip_parameters(content_type);
        self.allowed_content_types.is_empty()
            || self
                .allowed_content_types
                .iter()
                .any(|allowed| mime_matches(allowed, mime))
    }
}

fn mime_matches(allowed: &str, mime: &str) -> bool {
    match allowed.strip_suffix("/*") {
        Some(family) => mime
            .split_once('/')
            .is_some_and(|(kind, _)| kind.eq_ignore_ascii_case(family)),
        None => allowed.eq_ignore_ascii_case(mime),
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

/// One GET per call, with a fresh client so the redirect count belongs to
/// that request alone.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn client(&self, redirects: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let limit = self.settings.redirect_limit;
        let policy = Policy::custom(move |attempt| {
            let hops = attempt.previous().len();
            redirects.store(hops, Ordering::Relaxed);
            if hops > limit {
                attempt.error(format!("more than {limit} redirects"))
            } else {
                attempt.follow()
            }
        });

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(policy)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    /// Status, declared length and content type; returns the content type.
    fn check_head(&self, response: &Response) -> Result<Option<String>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(declared) = response.content_length().filter(|len| *len > max_bytes) {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(declared),
                },
                "declared length",
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        match content_type.as_deref() {
            Some(ct) if !self.settings.accepts(ct) => Err(FetchError::new(
                FailureKind::UnsupportedContentType {
                    content_type: strip_parameters(ct).to_string(),
                },
                response.url().as_str(),
            )),
            _ => Ok(content_type),
        }
    }
}

/// Streams the body, giving up as soon as it grows past `max_bytes`.
async fn read_limited(response: Response, max_bytes: u64) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let received = (body.len() + chunk.len()) as u64;
        if received > max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(received),
                },
                "streamed length",
            ));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let target = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let redirects = Arc::new(AtomicUsize::new(0));

        let response = self
            .client(redirects.clone())?
            .get(target)
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let content_type = self.check_head(&response)?;
        let final_url = response.url().to_string();
        let bytes = read_limited(response, self.settings.max_bytes).await?;

        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                redirect_count: redirects.load(Ordering::Relaxed),
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_a_mime_family() {
        assert!(mime_matches("image/*", "image/webp"));
        assert!(mime_matches("text/html", "TEXT/HTML"));
        assert!(!mime_matches("image/*", "text/html"));
        assert!(!mime_matches("image/*", "image"));
    }

    #[test]
    fn parameters_are_ignored_and_empty_list_accepts_all() {
        assert!(FetchSettings::for_page().accepts("text/html; charset=utf-8"));
        assert!(!FetchSettings::for_page().accepts("application/json"));
        assert!(FetchSettings::for_feed().accepts("application/rss+xml"));
    }

    #[test]
    fn images_accept_generic_binary_labels() {
        let images = FetchSettings::for_image();
        assert!(images.accepts("image/jpeg"));
        assert!(images.accepts("binary/octet-stream"));
        assert!(images.accepts("Application/Octet-Stream"));
        assert!(!images.accepts("text/html"));
    }
}
