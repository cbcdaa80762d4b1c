mod aggregator;
mod image;
mod normalize;
mod sanitize;

use std::collections::HashSet;

pub use aggregator::FeedAggregator;
pub use image::{ImageResolver, ImageStrategy, FALLBACK_IMAGES};
pub use normalize::{ArticleNormalizer, Normalized, SkipReason, DESCRIPTION_WORDS};
pub use sanitize::{sanitize, DescriptionSanitizer};

/// Default minimum plain-text description length when short items are skipped
pub const DEFAULT_SHORT_CONTENT_THRESHOLD: usize = 100;

/// Filtering rules applied during one aggregation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Exact (trimmed) titles to drop
    pub blocked_titles: HashSet<String>,
    /// Literal phrases removed from descriptions, in order
    pub custom_filter_patterns: Vec<String>,
    pub skip_short_content: bool,
    pub short_content_threshold: usize,
    pub use_fallback_images: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blocked_titles: HashSet::new(),
            custom_filter_patterns: Vec::new(),
            skip_short_content: false,
            short_content_threshold: DEFAULT_SHORT_CONTENT_THRESHOLD,
            use_fallback_images: true,
        }
    }
}
