use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::FilterConfig;

/// Photo credit and caption boilerplate stripped from every description
static CREDIT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Photo by[^.]+\.",
        r"(?i)Photo: [^.]+\.",
        r"(?i)Credit: [^.]+\.",
        r"(?i)Photo credit: [^.]+\.",
        r"(?i)via Getty Images[^.]*\.",
        r"(?i)AP Photo[^.]*\.",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Strips credit boilerplate and configured phrases from descriptions
///
/// Custom phrases are matched literally and case-insensitively; they are
/// escaped before compilation and never interpreted as patterns.
#[derive(Debug, Clone)]
pub struct DescriptionSanitizer {
    custom: Vec<Regex>,
}

impl DescriptionSanitizer {
    pub fn new(config: &FilterConfig) -> Self {
        let custom = config
            .custom_filter_patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .filter_map(|p| {
                RegexBuilder::new(&regex::escape(p))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| tracing::warn!("Ignoring custom filter '{}': {}", p, e))
                    .ok()
            })
            .collect();

        Self { custom }
    }

    /// Apply every pattern in order, then collapse whitespace runs and trim
    pub fn sanitize(&self, description: &str) -> String {
        let mut text = description.to_string();

        for pattern in CREDIT_PATTERNS.iter().chain(self.custom.iter()) {
            if let std::borrow::Cow::Owned(stripped) = pattern.replace_all(&text, "") {
                text = stripped;
            }
        }

        WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
    }
}

/// Convenience wrapper building a one-off sanitizer
pub fn sanitize(description: &str, config: &FilterConfig) -> String {
    DescriptionSanitizer::new(config).sanitize(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(patterns: &[&str]) -> FilterConfig {
        FilterConfig {
            custom_filter_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            ..FilterConfig::default()
        }
    }

    #[test]
    fn test_strips_general_credit_patterns() {
        let config = FilterConfig::default();
        assert_eq!(
            sanitize("The Sox won. Photo by Jane Doe/USA Today. More later.", &config),
            "The Sox won. More later."
        );
        assert_eq!(
            sanitize("Game recap. Credit: John Smith. Next game Friday.", &config),
            "Game recap. Next game Friday."
        );
        assert_eq!(
            sanitize("Fans cheer (Winslow Townson via Getty Images). Score was 3-2.", &config),
            "Fans cheer (Winslow Townson Score was 3-2."
        );
        assert_eq!(
            sanitize("Celebration (AP Photo/Charles Krupa). Final.", &config),
            "Celebration ( Final."
        );
    }

    #[test]
    fn test_custom_patterns_are_literal_and_case_insensitive() {
        let config = config_with(&["  Read more at NESN.com  ", "", "   ", "(.*)"]);
        assert_eq!(
            sanitize("Great game. read MORE at nesn.com Done (.*) here", &config),
            "Great game. Done here"
        );
        // The dot is literal, so it must not match an arbitrary character
        assert_eq!(
            sanitize("Read more at NESNxcom", &config),
            "Read more at NESNxcom"
        );
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        let config = FilterConfig::default();
        assert_eq!(sanitize("  a \t\n b  c ", &config), "a b c");
        assert_eq!(sanitize("single\nnewline", &config), "single\nnewline");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let config = config_with(&["Sponsored"]);
        let inputs = [
            "Photo by A. Photo: B. Sponsored text  with   gaps.",
            "  Credit: Someone. AP Photo. Hello world  ",
            "<p>Markup stays <img src=\"x.jpg\"> intact</p>",
        ];
        for input in inputs {
            let once = sanitize(input, &config);
            assert_eq!(sanitize(&once, &config), once);
        }
    }

    #[test]
    fn test_patterns_apply_in_order() {
        // "Photo credit: X." is consumed by the earlier "Credit: " pattern,
        // leaving "Photo " which the later whitespace pass trims.
        let config = FilterConfig::default();
        assert_eq!(sanitize("Photo credit: X. Body.", &config), "Photo Body.");
    }
}
