use crate::sitemap::Page;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    /// `<urlset>` document or plain-text URL list
    UrlSet(Vec<Page>),
    /// `<sitemapindex>` document listing child sitemap URLs
    Index(Vec<String>),
    /// Anything else, e.g. an HTML error page served with status 200
    Unrecognized,
}

/// Parses a sitemap body
///
/// Supports the sitemaps.org `urlset` and `sitemapindex` formats (namespace
/// prefixes are ignored) and plain-text sitemaps with one URL per line.
pub fn parse_sitemap(content: &str) -> SitemapDocument {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('<') {
        parse_xml_sitemap(trimmed)
    } else {
        parse_text_sitemap(trimmed)
    }
}

fn parse_text_sitemap(content: &str) -> SitemapDocument {
    let pages: Vec<Page> = content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .map(|line| Page::new(line, None))
        .collect();

    if pages.is_empty() {
        SitemapDocument::Unrecognized
    } else {
        SitemapDocument::UrlSet(pages)
    }
}

#[derive(PartialEq)]
enum RootKind {
    Unknown,
    UrlSet,
    Index,
}

fn parse_xml_sitemap(xml: &str) -> SitemapDocument {
    let mut root = RootKind::Unknown;
    let mut pages = Vec::new();
    let mut children = Vec::new();

    // Open elements by local name; `loc` and `lastmod` only count as direct
    // children of an entry, so extension blocks like `<image:image>` are ignored.
    let mut open: Vec<String> = Vec::new();
    let mut current_loc = String::new();
    let mut current_lastmod: Option<String> = None;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match (name.as_str(), open.len()) {
                    ("urlset", 0) => root = RootKind::UrlSet,
                    ("sitemapindex", 0) => root = RootKind::Index,
                    ("url", 1) | ("sitemap", 1) => {
                        current_loc.clear();
                        current_lastmod = None;
                    }
                    _ => {}
                }
                open.push(name);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(tag) = entry_field(&open) {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    capture(tag, text, &mut current_loc, &mut current_lastmod);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(tag) = entry_field(&open) {
                    let text = String::from_utf8_lossy(&e.into_inner()).trim().to_string();
                    capture(tag, text, &mut current_loc, &mut current_lastmod);
                }
            }
            Ok(Event::End(_)) => {
                let closed = open.pop();
                if open.len() == 1 {
                    match (closed.as_deref(), &root) {
                        (Some("url"), RootKind::UrlSet) if !current_loc.is_empty() => {
                            pages.push(Page::new(
                                current_loc.clone(),
                                current_lastmod.as_deref().map(normalize_last_modified),
                            ));
                        }
                        (Some("sitemap"), RootKind::Index) if !current_loc.is_empty() => {
                            children.push(current_loc.clone());
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    match root {
        RootKind::UrlSet => SitemapDocument::UrlSet(pages),
        RootKind::Index => SitemapDocument::Index(children),
        RootKind::Unknown => SitemapDocument::Unrecognized,
    }
}

/// The innermost open element when it sits directly inside a root entry
fn entry_field(open: &[String]) -> Option<&str> {
    match open {
        [_, entry, field] if entry == "url" || entry == "sitemap" => Some(field.as_str()),
        _ => None,
    }
}

fn capture(tag: &str, text: String, loc: &mut String, lastmod: &mut Option<String>) {
    if text.is_empty() {
        return;
    }
    match tag {
        "loc" => *loc = text,
        "lastmod" => *lastmod = Some(text),
        _ => {}
    }
}

/// Normalizes a sitemap `lastmod` value to RFC 3339
///
/// Date-only values become midnight UTC. Values in no recognized W3C datetime
/// form are returned unchanged.
pub fn normalize_last_modified(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.to_rfc3339();
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return dt.to_rfc3339();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.and_utc().to_rfc3339();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return dt.and_utc().to_rfc3339();
        }
    }

    raw.to_string()
}
