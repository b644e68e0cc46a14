use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Newest item of a content feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedEntry {
    /// Article identifier, normally the entry link.
    pub id: String,
    /// Title with markup removed.
    pub title: String,
    /// Embedded content or summary, possibly HTML.
    pub summary: String,
}

impl FeedEntry {
    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty() && !self.title.trim().is_empty()
    }
}

/// What could be resolved from an article page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleContent {
    pub image_url: Option<String>,
    pub body: String,
}

/// Opaque platform authentication state.
///
/// The core never looks inside; only the platform client interprets it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionBlob(Value);

impl SessionBlob {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Debug for SessionBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionBlob(..)")
    }
}
