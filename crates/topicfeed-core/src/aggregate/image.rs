use std::sync::LazyLock;

use regex::Regex;

use super::FilterConfig;
use crate::feed::RawFeedItem;
use crate::text::clean_url;

/// Brand substring (matched case-insensitively against the source label)
/// and the image used when none of its items carry one
pub const FALLBACK_IMAGES: &[(&str, &str)] = &[(
    "NESN",
    "https://s47719.pcdn.co/wp-content/plugins/arsenal-images/dist/svg/nesn-editorial.svg",
)];

/// Generic meta tags that sometimes carry an image URL instead of an ID
const META_IMAGE_FIELDS: &[&str] = &["_thumbnail_id", "featured_image", "post_image", "image_url"];

static THUMBNAIL_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""thumbnailUrl"\s*:\s*"([^"]+)""#).unwrap());

static IMG_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img[^>]+src=['"]([^'"]+)['"][^>]*>"#).unwrap());

fn first_img_src(html: &str) -> Option<&str> {
    IMG_SRC_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// One self-contained image extraction attempt
pub trait ImageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return a validated image URL, or `None` to defer to the next strategy
    fn try_extract(&self, item: &RawFeedItem) -> Option<String>;
}

/// `<enclosure url="...">`
pub struct EnclosureLink;

impl ImageStrategy for EnclosureLink {
    fn name(&self) -> &'static str {
        "enclosure"
    }

    fn try_extract(&self, item: &RawFeedItem) -> Option<String> {
        item.enclosure
            .as_ref()
            .and_then(|e| e.link.as_deref())
            .and_then(clean_url)
    }
}

/// First `<media:content url="...">`
pub struct MediaContent;

impl ImageStrategy for MediaContent {
    fn name(&self) -> &'static str {
        "media:content"
    }

    fn try_extract(&self, item: &RawFeedItem) -> Option<String> {
        item.media_content
            .first()
            .and_then(|m| m.url.as_deref())
            .and_then(clean_url)
    }
}

/// First `<media:thumbnail url="...">`
pub struct MediaThumbnail;

impl ImageStrategy for MediaThumbnail {
    fn name(&self) -> &'static str {
        "media:thumbnail"
    }

    fn try_extract(&self, item: &RawFeedItem) -> Option<String> {
        item.media_thumbnails
            .first()
            .and_then(|m| m.url.as_deref())
            .and_then(clean_url)
    }
}

/// `content:encoded` body: embedded JSON-LD `thumbnailUrl`, else the first `<img>`
///
/// When a `thumbnailUrl` field is present the `<img>` scan is not attempted,
/// even if that field's value turns out to be unusable.
pub struct EncodedContent;

impl ImageStrategy for EncodedContent {
    fn name(&self) -> &'static str {
        "content:encoded"
    }

    fn try_extract(&self, item: &RawFeedItem) -> Option<String> {
        let content = item.content_encoded.as_deref().filter(|c| !c.is_empty())?;

        match THUMBNAIL_URL_RE.captures(content).and_then(|c| c.get(1)) {
            Some(thumbnail) => clean_url(thumbnail.as_str()),
            None => first_img_src(content).and_then(clean_url),
        }
    }
}

/// Data of a named item tag, e.g. `<post-thumbnail>`
pub struct NamedTag(pub &'static str);

impl ImageStrategy for NamedTag {
    fn name(&self) -> &'static str {
        self.0
    }

    fn try_extract(&self, item: &RawFeedItem) -> Option<String> {
        item.tag(self.0).and_then(clean_url)
    }
}

/// First `<img>` in the plain description
pub struct DescriptionImage;

impl ImageStrategy for DescriptionImage {
    fn name(&self) -> &'static str {
        "description"
    }

    fn try_extract(&self, item: &RawFeedItem) -> Option<String> {
        first_img_src(&item.description).and_then(clean_url)
    }
}

/// First of [`META_IMAGE_FIELDS`] whose data is already a URL
///
/// Values that are not URLs (attachment IDs and the like) are skipped.
pub struct MetaFields;

impl ImageStrategy for MetaFields {
    fn name(&self) -> &'static str {
        "meta fields"
    }

    fn try_extract(&self, item: &RawFeedItem) -> Option<String> {
        META_IMAGE_FIELDS
            .iter()
            .filter_map(|field| item.tag(field))
            .find_map(clean_url)
    }
}

/// Finds a representative image for a feed item
pub struct ImageResolver {
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(EnclosureLink),
                Box::new(MediaContent),
                Box::new(MediaThumbnail),
                Box::new(EncodedContent),
                Box::new(NamedTag("post-thumbnail")),
                Box::new(NamedTag("featuredImage")),
                Box::new(DescriptionImage),
                Box::new(MetaFields),
            ],
        }
    }
}

impl ImageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy names in evaluation order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First image any strategy finds, else the source's fallback, else empty
    pub fn resolve(&self, item: &RawFeedItem, source_label: &str, config: &FilterConfig) -> String {
        for strategy in &self.strategies {
            if let Some(url) = strategy.try_extract(item) {
                tracing::debug!("Image for '{}' found via {}", item.title, strategy.name());
                return url;
            }
        }

        if config.use_fallback_images {
            if let Some(url) = fallback_image(source_label) {
                return url.to_string();
            }
        }

        String::new()
    }
}

fn fallback_image(source_label: &str) -> Option<&'static str> {
    let label = source_label.to_lowercase();
    FALLBACK_IMAGES
        .iter()
        .find(|(brand, _)| label.contains(&brand.to_lowercase()))
        .map(|(_, url)| *url)
}
