mod fetcher;
mod models;
mod opml;
mod parser;

use async_trait::async_trait;

pub use fetcher::FeedFetcher;
pub use models::{Article, Enclosure, FeedHandle, FeedSource, ItemTag, MediaRef, RawFeedItem};
pub use opml::{parse_opml, parse_opml_file};
pub use parser::{parse_date, parse_feed};

use crate::Result;

/// Source of parsed feeds
///
/// Errors are per feed; callers decide whether one failure matters.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeedHandle>;
}
