//! Mapping raw feed items to the public article shape.
//!
//! Everything here is pure: cover images and excerpts are scraped from the
//! HTML body with regular expressions, and every field has a fallback, so
//! normalization never fails.

use std::sync::LazyLock;

use chrono::{DateTime, Locale, Utc};
use regex::Regex;
use serde::Serialize;

use crate::fetcher::RawFeedItem;
use crate::source::UNKNOWN_SOURCE;

pub const DEFAULT_COVER_IMAGE: &str = "/file.svg";
pub const DEFAULT_AUTHOR: &str = "Anonim Yazar";
pub const DEFAULT_TITLE: &str = "Başlıksız";
pub const UNKNOWN_DATE: &str = "Tarih bilinmiyor";

const EXCERPT_MAX_CHARS: usize = 200;
const MIN_SNIPPET_CHARS: usize = 20;
const LONG_DATE_FORMAT: &str = "%-d %B %Y";

static MEDIUM_CDN_IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img.*?src=["'](https://cdn-images-.*?\.medium\.com/.*?)["']"#)
        .expect("valid medium image regex")
});
static RASTER_IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img.*?src=["'](.*?\.(?:png|jpg|jpeg|gif|webp))["']"#)
        .expect("valid raster image regex")
});
static ANY_IMG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img.*?src=["'](.*?)["']"#).expect("valid img regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[^>]+(>|$)").expect("valid tag regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Client-ready representation of one feed entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    pub title: String,
    pub link: String,
    pub author: String,
    pub date: String,
    pub categories: Vec<String>,
    pub cover_image: String,
    pub excerpt: String,
    pub source: String,
}

pub fn normalize(item: &RawFeedItem, locale: Locale) -> NormalizedArticle {
    let content = item.content.as_deref().unwrap_or("");

    let title = item
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    let date = match (item.published, item.pub_date.as_deref().map(str::trim)) {
        (Some(published), _) => format_published(published, locale),
        (None, Some(raw)) if !raw.is_empty() => format_date(raw, locale),
        _ => UNKNOWN_DATE.to_string(),
    };

    let mut excerpt = extract_excerpt(content, item.snippet.as_deref());
    if excerpt.is_empty() {
        excerpt = title.clone();
    }

    NormalizedArticle {
        link: item.link.clone(),
        author: item
            .creator
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        date,
        categories: item.categories.clone(),
        cover_image: extract_cover_image(content),
        excerpt,
        source: item
            .source
            .clone()
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        title,
    }
}

/// First image URL in `html`, preferring Medium CDN images, then raster
/// images, then any `<img>`. Falls back to [`DEFAULT_COVER_IMAGE`].
pub fn extract_cover_image(html: &str) -> String {
    [&*MEDIUM_CDN_IMG_RE, &*RASTER_IMG_RE, &*ANY_IMG_RE]
        .into_iter()
        .find_map(|re| {
            re.captures(html)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .filter(|src| !src.is_empty())
        })
        .unwrap_or(DEFAULT_COVER_IMAGE)
        .to_string()
}

/// Short plain-text excerpt. A snippet longer than 20 characters wins over
/// the stripped HTML body.
pub fn extract_excerpt(content: &str, snippet: Option<&str>) -> String {
    match snippet {
        Some(snippet) if snippet.chars().count() > MIN_SNIPPET_CHARS => truncate_excerpt(snippet),
        _ => truncate_excerpt(&strip_html(content)),
    }
}

/// Replace tags with spaces and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    WHITESPACE_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

fn truncate_excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_MAX_CHARS {
        let head: String = text.chars().take(EXCERPT_MAX_CHARS).collect();
        format!("{}...", head.trim())
    } else {
        text.trim().to_string()
    }
}

/// Render an RFC 2822 / RFC 3339 date as a long localized date. Anything
/// that doesn't parse is returned unchanged.
pub fn format_date(raw: &str, locale: Locale) -> String {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map(|dt| format_published(dt.with_timezone(&Utc), locale))
        .unwrap_or_else(|_| raw.to_string())
}

pub fn format_published(published: DateTime<Utc>, locale: Locale) -> String {
    published
        .format_localized(LONG_DATE_FORMAT, locale)
        .to_string()
}
