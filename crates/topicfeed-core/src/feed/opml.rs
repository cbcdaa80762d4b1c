use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::models::FeedSource;
use crate::{Error, Result};

/// Read feed sources from an OPML file
pub fn parse_opml_file(path: &Path) -> Result<Vec<FeedSource>> {
    let content = std::fs::read_to_string(path)?;
    parse_opml(&content)
}

/// Collect every `<outline>` carrying an `xmlUrl`
///
/// The label is the outline's `title`, then `text`, then the feed host.
pub fn parse_opml(content: &str) -> Result<Vec<FeedSource>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut sources = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"outline" => {
                let mut xml_url = None;
                let mut label = None;

                for attr in e.attributes().flatten() {
                    let value = || match attr.unescape_value() {
                        Ok(value) => value.trim().to_string(),
                        Err(_) => String::from_utf8_lossy(&attr.value).trim().to_string(),
                    };
                    match attr.key.as_ref() {
                        b"xmlUrl" => xml_url = Some(value()),
                        b"title" => label = Some(value()),
                        b"text" if label.is_none() => label = Some(value()),
                        _ => {}
                    }
                }

                // Category outlines have no xmlUrl
                if let Some(url) = xml_url.filter(|u| !u.is_empty()) {
                    sources.push(match label.filter(|l| !l.is_empty()) {
                        Some(label) => FeedSource::new(url, label),
                        None => FeedSource::from_url(url),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::FeedParse(format!("Failed to parse OPML: {}", e)));
            }
            _ => {}
        }
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_opml() {
        let opml = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head><title>Sports</title></head>
  <body>
    <outline text="Boston">
      <outline text="NESN" title="NESN Red Sox" xmlUrl="https://nesn.com/feed/" type="rss"/>
      <outline text="Globe Sports" xmlUrl="https://globe.example.com/sports.xml" type="rss"/>
    </outline>
    <outline xmlUrl="https://untitled.example.org/rss" type="rss"/>
  </body>
</opml>"#;

        let sources = parse_opml(opml).unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0], FeedSource::new("https://nesn.com/feed/", "NESN Red Sox"));
        assert_eq!(sources[1].label, "Globe Sports");
        assert_eq!(sources[2].label, "untitled.example.org");
    }

    #[test]
    fn test_parse_opml_unescapes_attributes() {
        let opml = r#"<opml version="2.0"><body>
  <outline text="Scores &amp; Recaps" xmlUrl="https://scores.example.com/feed?team=bos&amp;format=rss"/>
</body></opml>"#;

        let sources = parse_opml(opml).unwrap();
        assert_eq!(sources[0].url, "https://scores.example.com/feed?team=bos&format=rss");
        assert_eq!(sources[0].label, "Scores & Recaps");
    }

    #[test]
    fn test_parse_opml_without_feeds() {
        let opml = r#"<opml version="2.0"><body><outline text="Empty"/></body></opml>"#;
        assert!(parse_opml(opml).unwrap().is_empty());
    }
}
