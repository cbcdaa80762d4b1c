use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::{FilterConfig, DEFAULT_SHORT_CONTENT_THRESHOLD};
use crate::feed::{parse_opml_file, FeedSource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Articles shown when the caller does not ask for a count
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// OPML file with additional feeds
    #[serde(default)]
    pub feeds_opml: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_items: default_max_items(),
            feeds_opml: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL for feed fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Feeds fetched in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Responses larger than this are rejected
    #[serde(default = "default_max_feed_bytes")]
    pub max_feed_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            proxy_url: None,
            concurrency: default_concurrency(),
            max_feed_bytes: default_max_feed_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Item titles to drop (exact match after trimming)
    #[serde(default)]
    pub blocked_titles: LineList,
    /// Phrases removed from descriptions, matched literally and case-insensitively
    #[serde(default)]
    pub custom_filters: LineList,
    #[serde(default)]
    pub skip_short_content: bool,
    #[serde(default = "default_short_content_threshold")]
    pub short_content_threshold: usize,
    #[serde(default = "default_true")]
    pub use_fallback_images: bool,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            blocked_titles: LineList::default(),
            custom_filters: LineList::default(),
            skip_short_content: false,
            short_content_threshold: default_short_content_threshold(),
            use_fallback_images: default_true(),
        }
    }
}

/// One `[[feeds]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub url: String,
    /// Display name; the feed host is used when absent
    #[serde(default)]
    pub label: Option<String>,
}

impl FeedEntry {
    pub fn to_source(&self) -> FeedSource {
        match self.label.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => FeedSource::new(self.url.trim(), label),
            None => FeedSource::from_url(self.url.trim()),
        }
    }
}

/// A list of strings that can also be written as one multi-line string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineList(pub Vec<String>);

impl LineList {
    /// Trimmed, non-blank entries
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

// Accept either a sequence of strings or newline-separated text
impl<'de> Deserialize<'de> for LineList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, SeqAccess, Visitor};
        use std::fmt;

        struct LineListVisitor;

        impl<'de> Visitor<'de> for LineListVisitor {
            type Value = LineList;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a list of strings or a newline-separated string")
            }

            fn visit_str<E>(self, value: &str) -> Result<LineList, E>
            where
                E: de::Error,
            {
                Ok(LineList(value.lines().map(str::to_string).collect()))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<LineList, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut lines = Vec::new();
                while let Some(line) = seq.next_element::<String>()? {
                    lines.push(line);
                }
                Ok(LineList(lines))
            }
        }

        deserializer.deserialize_any(LineListVisitor)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_items() -> usize {
    30
}

fn default_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    4
}

fn default_max_feed_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_short_content_threshold() -> usize {
    DEFAULT_SHORT_CONTENT_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from `path`, or defaults if it does not exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/topicfeed/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("topicfeed")
            .join("config.toml")
    }

    /// Configured feeds followed by those in `general.feeds_opml`, unique by URL
    pub fn sources(&self) -> crate::Result<Vec<FeedSource>> {
        let mut sources: Vec<FeedSource> = self.feeds.iter().map(FeedEntry::to_source).collect();

        if let Some(path) = &self.general.feeds_opml {
            sources.extend(parse_opml_file(&expand_tilde(path))?);
        }

        let mut seen = HashSet::new();
        sources.retain(|source| {
            let first = seen.insert(source.url.clone());
            if !first {
                tracing::warn!("Ignoring duplicate feed {}", source.url);
            }
            first
        });

        Ok(sources)
    }

    /// Snapshot of the filter settings for one aggregation run
    pub fn filter_config(&self) -> FilterConfig {
        let filters = &self.filters;
        FilterConfig {
            blocked_titles: filters.blocked_titles.entries().map(str::to_string).collect(),
            custom_filter_patterns: filters.custom_filters.entries().map(str::to_string).collect(),
            skip_short_content: filters.skip_short_content,
            short_content_threshold: filters.short_content_threshold,
            use_fallback_images: filters.use_fallback_images,
        }
    }
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.general.max_items, 30);
        assert_eq!(config.sync.concurrency, 4);
        assert!(config.feeds.is_empty());

        let filters = config.filter_config();
        assert_eq!(filters, FilterConfig::default());
        assert_eq!(filters.short_content_threshold, 100);
        assert!(filters.use_fallback_images);
        assert!(!filters.skip_short_content);
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml(
            r#"
[general]
max_items = 12

[filters]
blocked_titles = ["  Breaking News ", "", "Live Blog"]
custom_filters = """
Read more at NESN.com

Sponsored
"""
skip_short_content = true
short_content_threshold = 80
use_fallback_images = false

[[feeds]]
url = "https://nesn.com/feed/"
label = "NESN"

[[feeds]]
url = "https://globe.example.com/sports.xml"

[[feeds]]
url = "https://nesn.com/feed/"
label = "Duplicate"
"#,
        )
        .unwrap();

        assert_eq!(config.general.max_items, 12);

        let filters = config.filter_config();
        assert!(filters.blocked_titles.contains("Breaking News"));
        assert!(filters.blocked_titles.contains("Live Blog"));
        assert_eq!(filters.blocked_titles.len(), 2);
        assert_eq!(
            filters.custom_filter_patterns,
            vec!["Read more at NESN.com".to_string(), "Sponsored".to_string()]
        );
        assert!(filters.skip_short_content);
        assert_eq!(filters.short_content_threshold, 80);
        assert!(!filters.use_fallback_images);

        let sources = config.sources().unwrap();
        assert_eq!(
            sources,
            vec![
                FeedSource::new("https://nesn.com/feed/", "NESN"),
                FeedSource::new("https://globe.example.com/sports.xml", "globe.example.com"),
            ]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[filters]\nskip_short_content = \"yes\""),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/topicfeed/config.toml")).unwrap();
        assert_eq!(config.general.log_level, "info");
    }
}
