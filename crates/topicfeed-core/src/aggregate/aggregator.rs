use std::sync::Arc;

use tokio::task::JoinSet;

use super::normalize::{ArticleNormalizer, Normalized};
use super::FilterConfig;
use crate::feed::{Article, FeedClient, FeedHandle, FeedSource};
use crate::{Error, Result};

type FetchOutcome = (usize, Result<FeedHandle>);

/// Fetches every configured feed and merges their articles into one
/// date-sorted list
pub struct FeedAggregator {
    client: Arc<dyn FeedClient>,
    concurrency: usize,
}

impl FeedAggregator {
    pub fn new(client: Arc<dyn FeedClient>) -> Self {
        Self {
            client,
            concurrency: 1,
        }
    }

    /// Number of feeds fetched at once (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Aggregate `sources` into at most `max_items` articles, newest first
    ///
    /// At most `max_items` items are read from each feed before merging, and
    /// the merged list is cut to `max_items` again after sorting. Feeds that
    /// fail to fetch are logged and skipped. Articles with equal dates keep
    /// source order, then feed order.
    pub async fn aggregate(
        &self,
        sources: &[FeedSource],
        config: &FilterConfig,
        max_items: usize,
    ) -> Result<Vec<Article>> {
        if max_items == 0 {
            return Err(Error::Config("max_items must be at least 1".to_string()));
        }

        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let feeds = self.fetch_all(sources).await;
        let normalizer = ArticleNormalizer::new(config);
        let mut articles = Vec::new();

        for (source, feed) in sources.iter().zip(feeds) {
            let Some(feed) = feed else {
                continue;
            };

            let before = articles.len();
            for item in feed.items(0, max_items) {
                match normalizer.normalize(item, &source.label) {
                    Normalized::Article(article) => articles.push(article),
                    Normalized::Skip(reason) => {
                        tracing::trace!("Skipping '{}' from {}: {:?}", item.title, source.label, reason);
                    }
                }
            }

            tracing::info!(
                "Feed '{}' ({}): {} articles accepted",
                source.label,
                feed.title.as_deref().unwrap_or(&source.url),
                articles.len() - before
            );
        }

        // Vec::sort_by is stable, so ties keep insertion order
        articles.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
        articles.truncate(max_items);

        tracing::info!("Aggregated {} articles from {} feeds", articles.len(), sources.len());

        Ok(articles)
    }

    /// Fetch every source with bounded parallelism
    ///
    /// The result is indexed like `sources`; failed fetches are `None`.
    async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<Option<FeedHandle>> {
        let mut feeds: Vec<Option<FeedHandle>> = vec![None; sources.len()];
        let mut join_set: JoinSet<FetchOutcome> = JoinSet::new();
        let mut pending = sources.iter().enumerate();

        fn spawn_fetch(
            join_set: &mut JoinSet<FetchOutcome>,
            client: Arc<dyn FeedClient>,
            index: usize,
            url: String,
        ) {
            join_set.spawn(async move {
                let result = client.fetch(&url).await;
                (index, result)
            });
        }

        for _ in 0..self.concurrency {
            if let Some((index, source)) = pending.next() {
                spawn_fetch(&mut join_set, Arc::clone(&self.client), index, source.url.clone());
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(feed))) => feeds[index] = Some(feed),
                Ok((index, Err(e))) => {
                    tracing::error!("Failed to fetch feed '{}': {}", sources[index].label, e);
                }
                Err(e) => tracing::error!("Feed fetch task failed: {}", e),
            }

            if let Some((index, source)) = pending.next() {
                spawn_fetch(&mut join_set, Arc::clone(&self.client), index, source.url.clone());
            }
        }

        feeds
    }
}
