pub mod aggregate;
pub mod config;
pub mod error;
pub mod feed;
pub mod text;

pub use aggregate::{FeedAggregator, FilterConfig};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use feed::{Article, FeedClient, FeedFetcher, FeedSource};
