use feed_rs::model::Entry;
use feedpost_core::FeedEntry;

use crate::extract::clean_text;

#[derive(Debug, thiserror::Error)]
#[error("feed could not be parsed: {0}")]
pub struct FeedError(#[from] feed_rs::parser::ParseFeedError);

/// First entry in document order, which publishers use for the newest item.
pub fn parse_latest_entry(bytes: &[u8]) -> Result<Option<FeedEntry>, FeedError> {
    let feed = feed_rs::parser::parse(bytes)?;
    Ok(feed.entries.into_iter().next().map(to_feed_entry))
}

fn to_feed_entry(entry: Entry) -> FeedEntry {
    let link = entry
        .links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|link| link.href.trim().to_string());
    let id = link
        .filter(|href| !href.is_empty())
        .unwrap_or_else(|| entry.id.trim().to_string());

    let title = entry
        .title
        .as_ref()
        .map(|text| clean_text(&text.content))
        .unwrap_or_default();

    let summary = entry
        .content
        .as_ref()
        .and_then(|content| content.body.clone())
        .filter(|body| !body.trim().is_empty())
        .or_else(|| entry.summary.as_ref().map(|text| text.content.clone()))
        .unwrap_or_default();

    FeedEntry { id, title, summary }
}
