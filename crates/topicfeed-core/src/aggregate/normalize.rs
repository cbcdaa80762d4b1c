use super::image::ImageResolver;
use super::sanitize::DescriptionSanitizer;
use super::FilterConfig;
use crate::feed::{Article, RawFeedItem};
use crate::text::{clean_url, decode_entities, escape_html, strip_markup, trim_words};

/// Words kept in an article description
pub const DESCRIPTION_WORDS: usize = 30;

/// Why an item produced no article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BlockedTitle,
    TooShort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Article(Article),
    Skip(SkipReason),
}

/// Turns raw feed items into display-ready articles
///
/// Built once per aggregation run so custom filter patterns are compiled
/// only once.
pub struct ArticleNormalizer<'a> {
    config: &'a FilterConfig,
    sanitizer: DescriptionSanitizer,
    images: ImageResolver,
}

impl<'a> ArticleNormalizer<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self {
            config,
            sanitizer: DescriptionSanitizer::new(config),
            images: ImageResolver::new(),
        }
    }

    pub fn normalize(&self, item: &RawFeedItem, source_label: &str) -> Normalized {
        if self.config.blocked_titles.contains(item.title.trim()) {
            return Normalized::Skip(SkipReason::BlockedTitle);
        }

        let plain = strip_markup(&item.description);

        if self.config.skip_short_content
            && plain.chars().count() < self.config.short_content_threshold
        {
            return Normalized::Skip(SkipReason::TooShort);
        }

        // Patterns run on plain text so tags cannot split a match
        let description = self.sanitizer.sanitize(&decode_entities(&plain));

        Normalized::Article(Article {
            title: escape_html(&decode_entities(&item.title)),
            link: item
                .permalink
                .as_deref()
                .and_then(clean_url)
                .unwrap_or_default(),
            description: trim_words(&escape_html(&description), DESCRIPTION_WORDS),
            publish_date: item.published.unwrap_or_default(),
            source: source_label.to_string(),
            image: self.images.resolve(item, source_label, self.config),
        })
    }
}
