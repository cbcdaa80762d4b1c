use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured feed subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    pub label: String,
}

impl FeedSource {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }

    /// Build a source whose label is the host of its URL
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let label = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.clone());
        Self { url, label }
    }
}

/// `<enclosure>` or Atom `rel="enclosure"` attachment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enclosure {
    pub link: Option<String>,
}

/// A Media-RSS `content` or `thumbnail` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRef {
    pub url: Option<String>,
}

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }
}

/// An un-namespaced child element of an item, e.g. `<post-thumbnail>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTag {
    pub name: String,
    pub data: String,
}

impl ItemTag {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// One parsed feed entry, as produced by the feed parser
#[derive(Debug, Clone, Default)]
pub struct RawFeedItem {
    pub title: String,
    /// May contain markup
    pub description: String,
    pub permalink: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub enclosure: Option<Enclosure>,
    pub media_content: Vec<MediaRef>,
    pub media_thumbnails: Vec<MediaRef>,
    /// Raw `content:encoded` markup
    pub content_encoded: Option<String>,
    pub tags: Vec<ItemTag>,
}

impl RawFeedItem {
    /// Data of the first tag with the given name
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.data.as_str())
    }
}

/// A fetched and parsed feed
#[derive(Debug, Clone, Default)]
pub struct FeedHandle {
    pub title: Option<String>,
    pub items: Vec<RawFeedItem>,
}

impl FeedHandle {
    pub fn new(items: Vec<RawFeedItem>) -> Self {
        Self { title: None, items }
    }

    /// Slice of at most `limit` items starting at `offset`
    pub fn items(&self, offset: usize, limit: usize) -> &[RawFeedItem] {
        let start = offset.min(self.items.len());
        let end = start.saturating_add(limit).min(self.items.len());
        &self.items[start..end]
    }
}

/// A display-ready article summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// HTML-escaped title
    pub title: String,
    /// Validated permalink, empty when the item had none
    pub link: String,
    pub description: String,
    pub publish_date: DateTime<Utc>,
    pub source: String,
    /// Empty when no image was found
    pub image: String,
}

impl Article {
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_label_falls_back_to_host() {
        let source = FeedSource::from_url("https://nesn.com/feed/");
        assert_eq!(source.label, "nesn.com");

        let source = FeedSource::from_url("not a url");
        assert_eq!(source.label, "not a url");
    }

    #[test]
    fn test_handle_items_window() {
        let items = (0..5)
            .map(|i| RawFeedItem {
                title: format!("item {}", i),
                ..Default::default()
            })
            .collect();
        let handle = FeedHandle::new(items);

        assert_eq!(handle.items(0, 3).len(), 3);
        assert_eq!(handle.items(3, 10).len(), 2);
        assert_eq!(handle.items(3, 10)[0].title, "item 3");
        assert!(handle.items(9, 2).is_empty());
        assert_eq!(handle.items(0, usize::MAX).len(), 5);
    }

    #[test]
    fn test_first_tag_wins() {
        let item = RawFeedItem {
            tags: vec![
                ItemTag::new("featuredImage", "https://a.example/1.jpg"),
                ItemTag::new("featuredImage", "https://a.example/2.jpg"),
            ],
            ..Default::default()
        };
        assert_eq!(item.tag("featuredImage"), Some("https://a.example/1.jpg"));
        assert_eq!(item.tag("missing"), None);
    }
}
