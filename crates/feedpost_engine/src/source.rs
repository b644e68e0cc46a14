use std::path::Path;

use engine_logging::{engine_debug, engine_warn};
use feedpost_core::{ArticleContent, FeedEntry};
use thiserror::Error;

use crate::decode::decode_page;
use crate::extract::{ArticleExtractor, ExtractSettings, HtmlArticleExtractor};
use crate::feed::{parse_latest_entry, FeedError};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::persist::{write_atomic, PersistError};
use crate::FetchError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("could not store download: {0}")]
    Persist(#[from] PersistError),
}

/// Where articles come from: the feed, the article pages and their images.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn latest_entry(&self, feed_url: &str) -> Result<Option<FeedEntry>, SourceError>;

    /// Never fails; an unreachable page yields no image and no body.
    async fn article(&self, url: &str) -> ArticleContent;

    async fn download_image(&self, url: &str, dest: &Path) -> Result<(), SourceError>;
}

pub struct WebContentSource {
    feeds: Box<dyn Fetcher>,
    pages: Box<dyn Fetcher>,
    images: Box<dyn Fetcher>,
    extractor: Box<dyn ArticleExtractor>,
}

impl WebContentSource {
    pub fn new(extract: ExtractSettings) -> Self {
        Self::with_parts(
            Box::new(ReqwestFetcher::new(FetchSettings::for_feed())),
            Box::new(ReqwestFetcher::new(FetchSettings::for_page())),
            Box::new(ReqwestFetcher::new(FetchSettings::for_image())),
            Box::new(HtmlArticleExtractor::new(extract)),
        )
    }

    pub fn with_parts(
        feeds: Box<dyn Fetcher>,
        pages: Box<dyn Fetcher>,
        images: Box<dyn Fetcher>,
        extractor: Box<dyn ArticleExtractor>,
    ) -> Self {
        Self {
            feeds,
            pages,
            images,
            extractor,
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for WebContentSource {
    async fn latest_entry(&self, feed_url: &str) -> Result<Option<FeedEntry>, SourceError> {
        let output = self.feeds.fetch(feed_url).await?;
        engine_debug!("Fetched feed {} ({} bytes)", feed_url, output.metadata.byte_len);
        Ok(parse_latest_entry(&output.bytes)?)
    }

    async fn article(&self, url: &str) -> ArticleContent {
        let output = match self.pages.fetch(url).await {
            Ok(output) => output,
            Err(err) => {
                engine_warn!("Article page {} unavailable: {}", url, err);
                return ArticleContent::default();
            }
        };
        let html = decode_page(&output);
        self.extractor.extract(&html, &output.metadata.final_url)
    }

    async fn download_image(&self, url: &str, dest: &Path) -> Result<(), SourceError> {
        let output = self.images.fetch(url).await?;
        write_atomic(dest, &output.bytes)?;
        engine_debug!(
            "Saved {} bytes of {} to {}",
            output.metadata.byte_len,
            output.mime_type().unwrap_or_else(|| "unknown type".to_string()),
            dest.display()
        );
        Ok(())
    }
}
