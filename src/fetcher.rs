use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::normalize::strip_html;

/// One feed entry as delivered by its source, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedItem {
    pub title: Option<String>,
    pub link: String,
    /// Full HTML body (`content:encoded` when present, else the description)
    pub content: Option<String>,
    /// Plain-text form of the description
    pub snippet: Option<String>,
    pub creator: Option<String>,
    pub categories: Vec<String>,
    /// Publication date exactly as written in the feed
    pub pub_date: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// Source tag, attached by the aggregator
    pub source: Option<String>,
}

/// Per-item fields recovered from the raw XML.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemExtras {
    pub pub_date: Option<String>,
    pub creator: Option<String>,
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<RawFeedItem>, FetchError> {
        debug!("Fetching feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        Self::items_from_bytes(url, &bytes)
    }

    /// Parse a feed body into raw items. `url` is only used for error reporting.
    pub fn items_from_bytes(url: &str, bytes: &[u8]) -> Result<Vec<RawFeedItem>, FetchError> {
        // feed_rs keeps neither the raw <pubDate> text nor always <dc:creator>
        let extras = Self::extract_item_extras(bytes);

        let parsed = parser::parse(bytes).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })?;

        let mut items = Vec::with_capacity(parsed.entries.len());
        for entry in parsed.entries {
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .unwrap_or_default();

            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty());

            if link.is_empty() {
                warn!(
                    "Skipping entry with no link: {}",
                    title.as_deref().unwrap_or("<untitled>")
                );
                continue;
            }

            let extra = extras.get(&link).cloned().unwrap_or_default();

            let summary = entry.summary.map(|s| s.content);
            let content = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| summary.clone());
            let snippet = summary
                .map(|s| strip_html(&s))
                .filter(|s| !s.is_empty());

            let creator = extra
                .creator
                .or_else(|| entry.authors.first().map(|p| p.name.trim().to_string()))
                .filter(|c| !c.is_empty());

            let published = entry.published.or(entry.updated);
            let pub_date = extra
                .pub_date
                .or_else(|| published.map(|dt| dt.to_rfc2822()));

            items.push(RawFeedItem {
                title,
                link,
                content,
                snippet,
                creator,
                categories: entry.categories.into_iter().map(|c| c.term).collect(),
                pub_date,
                published,
                source: None,
            });
        }

        Ok(items)
    }

    /// Extract raw `<pubDate>` and `<dc:creator>` values from RSS XML, keyed by item link.
    pub fn extract_item_extras(xml_bytes: &[u8]) -> HashMap<String, ItemExtras> {
        let mut extras = HashMap::new();
        let Ok(xml_str) = std::str::from_utf8(xml_bytes) else {
            return extras;
        };

        for item_block in xml_str.split("<item>").skip(1) {
            let item_end = item_block.find("</item>").unwrap_or(item_block.len());
            let item = &item_block[..item_end];

            let Some(link) = Self::extract_xml_element(item, "link") else {
                continue;
            };

            let entry = ItemExtras {
                pub_date: Self::extract_xml_element(item, "pubDate").filter(|d| !d.is_empty()),
                creator: Self::extract_xml_element(item, "dc:creator").filter(|c| !c.is_empty()),
            };

            if entry != ItemExtras::default() {
                extras.insert(link, entry);
            }
        }

        extras
    }

    /// Text of the first `<tag>` element, trimmed. A CDATA wrapper is removed;
    /// otherwise the predefined XML entities are decoded, matching what feed_rs
    /// reports for the same element.
    pub fn extract_xml_element(xml: &str, tag: &str) -> Option<String> {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);

        let start = xml.find(&start_tag)? + start_tag.len();
        let end = xml[start..].find(&end_tag)? + start;

        let text = xml[start..end].trim();
        let text = match text
            .strip_prefix("<![CDATA[")
            .and_then(|t| t.strip_suffix("]]>"))
        {
            Some(cdata) => cdata.to_string(),
            None => decode_xml_entities(text),
        };

        Some(text.trim().to_string())
    }
}

fn decode_xml_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    // &amp; last so "&amp;lt;" stays "&lt;"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
