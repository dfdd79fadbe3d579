//! Feed bodies in, unpersisted [`Article`]s out.

use chrono::{DateTime, NaiveDateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::{NewswireError, Result};
use crate::domain::Article;

/// Tried in order after commas are removed from the raw date.
const DATE_FORMATS: [&str; 2] = ["%a %d %b %Y %H:%M:%S %z", "%a %d %b %Y %H:%M:%S GMT"];

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]*>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Result of normalizing one feed body.
#[derive(Debug, Default)]
pub struct Normalized {
    pub articles: Vec<Article>,
    /// Entries dropped because they could not be turned into an article.
    pub skipped: usize,
}

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, source: &str, body: &[u8]) -> Result<Normalized> {
        let feed = parser::Builder::new()
            .timestamp_parser(parse_published)
            .build()
            .parse(body)
            .map_err(|e| NewswireError::FeedParse(format!("{}: {}", source, e)))?;

        let mut normalized = Normalized::default();
        for entry in feed.entries {
            match entry_to_article(entry) {
                Ok(article) => normalized.articles.push(article),
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "skipping feed entry");
                    normalized.skipped += 1;
                }
            }
        }

        Ok(normalized)
    }
}

fn entry_to_article(entry: Entry) -> Result<Article> {
    let title = entry
        .title
        .map(|t| decode_html_entities(&t.content).trim().to_string())
        .unwrap_or_default();

    let raw_content = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    let content = strip_markup(&raw_content);

    if title.is_empty() && content.is_empty() {
        return Err(NewswireError::FeedParse(format!(
            "entry {:?} has neither title nor content",
            entry.id
        )));
    }

    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let published = entry.published.map(|dt| dt.timestamp()).unwrap_or(0);

    Ok(Article::new(title, content, published, link))
}

/// Parse a feed date with the known formats; `None` leaves the article at timestamp zero.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();

    if let Ok(dt) = DateTime::parse_from_str(cleaned, DATE_FORMATS[0]) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(cleaned, DATE_FORMATS[1])
        .ok()
        .map(|naive| naive.and_utc())
}

/// Drop tags, decode entities, collapse whitespace.
pub fn strip_markup(s: &str) -> String {
    let decoded = decode_html_entities(s);
    let untagged = RE_TAGS.replace_all(&decoded, " ");
    RE_WS.replace_all(&untagged, " ").trim().to_string()
}
