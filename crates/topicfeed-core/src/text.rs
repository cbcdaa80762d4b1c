//! Markup and URL helpers shared by the normalization pipeline

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Appended to descriptions cut by [`trim_words`]
pub const TRUNCATION_MARKER: &str = "&hellip;";

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>").unwrap()
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Remove all markup, dropping `<script>`/`<style>` blocks with their content
pub fn strip_markup(html: &str) -> String {
    let without_blocks = SCRIPT_STYLE_RE.replace_all(html, "");
    TAG_RE.replace_all(&without_blocks, "").into_owned()
}

/// Decode HTML entities (`&amp;`, `&#8217;`, `&nbsp;`...) into plain text
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Escape plain text for safe inclusion in HTML, quotes included
pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Keep at most `max_words` whitespace-delimited words of plain text
///
/// Words are re-joined with single spaces. When words were dropped the
/// [`TRUNCATION_MARKER`] is appended.
pub fn trim_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    let mut trimmed = kept.join(" ");
    if words.next().is_some() {
        trimmed.push_str(TRUNCATION_MARKER);
    }
    trimmed
}

/// Validate a candidate URL, returning its normalized form
///
/// Only absolute `http`/`https` URLs are accepted. Protocol-relative
/// `//host/path` values are read as `https:`.
pub fn clean_url(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let parsed = if candidate.starts_with("//") {
        Url::parse(&format!("https:{}", candidate))
    } else {
        Url::parse(candidate)
    }
    .ok()?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(parsed.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(
            strip_markup("a<script type=\"text/javascript\">var x = 1;</script>b"),
            "ab"
        );
        assert_eq!(strip_markup("a<STYLE>p { color: red }</STYLE>b"), "ab");
        assert_eq!(strip_markup("no markup"), "no markup");
    }

    #[test]
    fn test_escape_html() {
        let escaped = escape_html(r#"Tom & Jerry's <"show">"#);
        assert!(escaped.starts_with("Tom &amp; Jerry"));
        assert!(escaped.ends_with("s &lt;&quot;show&quot;&gt;"));
        assert!(!escaped.contains('\''));
    }

    #[test]
    fn test_decode_then_escape_does_not_double_escape() {
        assert_eq!(
            decode_entities("Sox &amp; Yanks &#8211; Game&nbsp;1"),
            "Sox & Yanks \u{2013} Game\u{a0}1"
        );
        assert_eq!(escape_html(&decode_entities("Sox &amp; Yanks")), "Sox &amp; Yanks");
        assert_eq!(escape_html(&decode_entities("Sox & Yanks")), "Sox &amp; Yanks");
    }

    #[test]
    fn test_trim_words_short_text_untouched() {
        assert_eq!(trim_words("one  two\nthree", 30), "one two three");
    }

    #[test]
    fn test_trim_words_cuts_and_marks() {
        let text = (1..=40).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let trimmed = trim_words(&text, 30);
        assert!(trimmed.starts_with("w1 w2 "));
        assert!(trimmed.ends_with("w30&hellip;"));
        assert!(!trimmed.contains("w31"));
    }

    #[test]
    fn test_trim_words_exact_count_not_marked() {
        let text = (1..=30).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        assert!(!trim_words(&text, 30).ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_clean_url() {
        assert_eq!(
            clean_url("https://example.com/img/a.jpg").as_deref(),
            Some("https://example.com/img/a.jpg")
        );
        assert_eq!(
            clean_url("  http://example.com/a b.png ").as_deref(),
            Some("http://example.com/a%20b.png")
        );
        assert_eq!(
            clean_url("//cdn.example.com/a.jpg").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(clean_url("12345"), None);
        assert_eq!(clean_url("/relative/path.jpg"), None);
        assert_eq!(clean_url("javascript:alert(1)"), None);
        assert_eq!(clean_url(""), None);
    }
}
