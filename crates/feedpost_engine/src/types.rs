use thiserror::Error;

/// Body and transfer details of one successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    /// After redirects; relative references in the page resolve against it.
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

impl FetchOutput {
    /// Mime type without parameters, lowercased.
    pub fn mime_type(&self) -> Option<String> {
        self.metadata
            .content_type
            .as_deref()
            .map(strip_parameters)
            .map(str::to_ascii_lowercase)
    }
}

pub(crate) fn strip_parameters(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} ({detail})")]
pub struct FetchError {
    pub kind: FailureKind,
    pub detail: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Why a download did not produce a body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error("malformed url")]
    InvalidUrl,
    #[error("server answered {0}")]
    HttpStatus(u16),
    #[error("timed out")]
    Timeout,
    #[error("too many redirects")]
    RedirectLimitExceeded,
    #[error("body exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("content type {content_type} not accepted")]
    UnsupportedContentType { content_type: String },
    #[error("connection failed")]
    Network,
}
