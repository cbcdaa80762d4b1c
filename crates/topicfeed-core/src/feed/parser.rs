use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use super::models::{Enclosure, FeedHandle, ItemTag, MediaRef, RawFeedItem};
use crate::{Error, Result};

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const RSS1_NS: &[u8] = b"http://purl.org/rss/1.0/";
const MEDIA_NS: &[u8] = b"http://search.yahoo.com/mrss/";
const CONTENT_NS: &[u8] = b"http://purl.org/rss/1.0/modules/content/";
const DC_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";

/// Namespaces the parser distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    None,
    Atom,
    Rss1,
    Media,
    Content,
    Dc,
    Other,
}

impl Ns {
    fn classify(resolved: &ResolveResult) -> Self {
        match resolved {
            ResolveResult::Unbound => Ns::None,
            ResolveResult::Bound(Namespace(ns)) => {
                let ns: &[u8] = ns;
                [
                    (ATOM_NS, Ns::Atom),
                    (RSS1_NS, Ns::Rss1),
                    (MEDIA_NS, Ns::Media),
                    (CONTENT_NS, Ns::Content),
                    (DC_NS, Ns::Dc),
                ]
                .into_iter()
                .find(|(uri, _)| *uri == ns)
                .map(|(_, kind)| kind)
                .unwrap_or(Ns::Other)
            }
            ResolveResult::Unknown(_) => Ns::Other,
        }
    }

    /// RSS 2.0, RSS 1.0 and Atom core vocabulary
    fn is_core(self) -> bool {
        matches!(self, Ns::None | Ns::Atom | Ns::Rss1)
    }
}

/// What to do with the text of an item's direct child element
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    AtomContent,
    Link,
    Guid { is_permalink: bool },
    Published,
    Updated,
    Encoded,
    Other,
}

struct OpenChild {
    field: Field,
    /// Recorded as an item tag when the element is un-namespaced
    tag_name: Option<String>,
    text: String,
}

#[derive(Default)]
struct ItemBuilder {
    item: RawFeedItem,
    link: Option<String>,
    guid: Option<String>,
    published: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    description: Option<String>,
    atom_content: Option<String>,
}

impl ItemBuilder {
    fn start_child(&mut self, ns: Ns, name: &str, e: &BytesStart) -> OpenChild {
        let field = match (ns, name) {
            (ns, "title") if ns.is_core() => Field::Title,
            (ns, "description") if ns.is_core() => Field::Description,
            (Ns::Atom, "summary") => Field::Description,
            (Ns::Atom, "content") => Field::AtomContent,
            (Ns::Atom, "link") => {
                self.atom_link(e);
                Field::Other
            }
            (ns, "link") if ns.is_core() => Field::Link,
            (Ns::None, "guid") => Field::Guid {
                is_permalink: attr(e, "isPermaLink")
                    .map(|v| !v.eq_ignore_ascii_case("false"))
                    .unwrap_or(true),
            },
            (Ns::None, "pubDate") | (Ns::Atom, "published") | (Ns::Dc, "date") => Field::Published,
            (Ns::Atom, "updated") => Field::Updated,
            (Ns::None, "enclosure") => {
                if self.item.enclosure.is_none() {
                    self.item.enclosure = Some(Enclosure { link: attr(e, "url") });
                }
                Field::Other
            }
            (Ns::Media, "content") => {
                self.item.media_content.push(MediaRef { url: attr(e, "url") });
                Field::Other
            }
            (Ns::Media, "thumbnail") => {
                self.item.media_thumbnails.push(MediaRef { url: attr(e, "url") });
                Field::Other
            }
            (Ns::Content, "encoded") => Field::Encoded,
            _ => Field::Other,
        };

        OpenChild {
            field,
            tag_name: (ns == Ns::None).then(|| name.to_string()),
            text: String::new(),
        }
    }

    fn atom_link(&mut self, e: &BytesStart) {
        let Some(href) = attr(e, "href") else {
            return;
        };
        match attr(e, "rel").as_deref() {
            None | Some("alternate") => {
                if self.link.is_none() {
                    self.link = Some(href);
                }
            }
            Some("enclosure") => {
                if self.item.enclosure.is_none() {
                    self.item.enclosure = Some(Enclosure { link: Some(href) });
                }
            }
            _ => {}
        }
    }

    fn finish_child(&mut self, child: OpenChild) {
        let text = child.text;

        match child.field {
            Field::Title => self.item.title = text.trim().to_string(),
            Field::Description => {
                if self.description.is_none() {
                    self.description = Some(text.trim().to_string());
                }
            }
            Field::AtomContent => self.atom_content = Some(text.trim().to_string()),
            Field::Link => {
                if self.link.is_none() && !text.trim().is_empty() {
                    self.link = Some(text.trim().to_string());
                }
            }
            Field::Guid { is_permalink } => {
                if is_permalink {
                    self.guid = Some(text.trim().to_string());
                }
            }
            Field::Published => {
                if self.published.is_none() {
                    self.published = parse_date(&text);
                }
            }
            Field::Updated => {
                if self.updated.is_none() {
                    self.updated = parse_date(&text);
                }
            }
            Field::Encoded => self.item.content_encoded = Some(text.clone()),
            Field::Other => {}
        }

        if let Some(name) = child.tag_name {
            self.item.tags.push(ItemTag::new(name, text.trim()));
        }
    }

    fn build(self) -> RawFeedItem {
        let mut item = self.item;
        item.description = self
            .description
            .filter(|d| !d.is_empty())
            .or(self.atom_content)
            .unwrap_or_default();
        item.permalink = self.link.or(self.guid).filter(|l| !l.is_empty());
        item.published = self.published.or(self.updated);
        item
    }
}

/// Unescaped value of the attribute with the given local name
fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .map(|a| match a.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
        })
}

/// Parse the date formats seen in RSS and Atom feeds
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an RSS 2.0, RSS 1.0 or Atom document
pub fn parse_feed(content: &[u8]) -> Result<FeedHandle> {
    let mut reader = NsReader::from_reader(content);
    let mut buf = Vec::new();

    // Local names of the currently open elements
    let mut stack: Vec<String> = Vec::new();
    let mut root_checked = false;
    let mut feed_title: Option<String> = None;
    let mut title_text: Option<String> = None;
    let mut current: Option<(usize, ItemBuilder)> = None;
    let mut child: Option<OpenChild> = None;
    let mut items = Vec::new();

    loop {
        let (resolved, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| Error::FeedParse(format!("Invalid feed XML: {}", e)))?;
        let ns = Ns::classify(&resolved);

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

                if !root_checked {
                    if !matches!(name.as_str(), "rss" | "RDF" | "feed") {
                        return Err(Error::FeedParse(format!(
                            "Not an RSS or Atom document (root element <{}>)",
                            name
                        )));
                    }
                    root_checked = true;
                }

                let depth = stack.len();
                match current.as_mut() {
                    None if !is_empty && ns.is_core() && (name == "item" || name == "entry") => {
                        current = Some((depth, ItemBuilder::default()));
                    }
                    None => {
                        let parent = stack.last().map(String::as_str);
                        if !is_empty
                            && name == "title"
                            && feed_title.is_none()
                            && matches!(parent, Some("channel") | Some("feed"))
                        {
                            title_text = Some(String::new());
                        }
                    }
                    Some((item_depth, builder)) if depth == *item_depth + 1 => {
                        let open = builder.start_child(ns, &name, e);
                        if is_empty {
                            builder.finish_child(open);
                        } else {
                            child = Some(open);
                        }
                    }
                    Some(_) => {}
                }

                if !is_empty {
                    stack.push(name);
                }
            }
            Event::Text(ref t) => {
                let text = t
                    .unescape()
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(t).into_owned());
                if let Some(open) = child.as_mut() {
                    open.text.push_str(&text);
                } else if let Some(title) = title_text.as_mut() {
                    title.push_str(&text);
                }
            }
            Event::CData(ref c) => {
                let text = String::from_utf8_lossy(c);
                if let Some(open) = child.as_mut() {
                    open.text.push_str(&text);
                } else if let Some(title) = title_text.as_mut() {
                    title.push_str(&text);
                }
            }
            Event::End(_) => {
                stack.pop();
                let depth = stack.len();

                if let Some(title) = title_text.take() {
                    feed_title = Some(title.trim().to_string());
                }

                if let Some(item_depth) = current.as_ref().map(|(d, _)| *d) {
                    if depth == item_depth + 1 {
                        if let (Some(open), Some((_, builder))) = (child.take(), current.as_mut()) {
                            builder.finish_child(open);
                        }
                    } else if depth == item_depth {
                        if let Some((_, builder)) = current.take() {
                            items.push(builder.build());
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if !root_checked {
        return Err(Error::FeedParse("Empty feed document".to_string()));
    }

    Ok(FeedHandle {
        title: feed_title.filter(|t| !t.is_empty()),
        items,
    })
}
