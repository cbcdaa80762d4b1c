use std::sync::Arc;

use anyhow::Result;

use topicfeed_core::{AppConfig, Article, FeedAggregator, FeedFetcher};

pub async fn run(config: &AppConfig, max: Option<usize>, json: bool) -> Result<()> {
    let sources = config.sources()?;
    let filters = config.filter_config();
    let max_items = max.unwrap_or(config.general.max_items);

    let fetcher = FeedFetcher::new(&config.sync)?;
    let aggregator =
        FeedAggregator::new(Arc::new(fetcher)).with_concurrency(config.sync.concurrency);

    let articles = aggregator.aggregate(&sources, &filters, max_items).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&articles)?);
        return Ok(());
    }

    if articles.is_empty() {
        println!("No items.");
        return Ok(());
    }

    for article in &articles {
        print_article(article);
    }

    Ok(())
}

fn print_article(article: &Article) {
    println!(
        "{} | {}",
        article.source,
        article.publish_date.format("%b %-d")
    );
    println!("  {}", article.title);
    if !article.description.is_empty() {
        println!("  {}", article.description);
    }
    if !article.link.is_empty() {
        println!("  {}", article.link);
    }
    if article.has_image() {
        println!("  Image: {}", article.image);
    }
    println!();
}
