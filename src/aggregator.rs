use std::cmp::Ordering;

use tracing::{debug, error};

use crate::fetcher::{Fetcher, RawFeedItem};
use crate::source::source_name;

/// Fetch every feed in order, one at a time, and merge the results newest
/// first. A failing source is logged and skipped; if every source fails the
/// result is simply empty.
pub async fn fetch_all(fetcher: &Fetcher, urls: &[String]) -> Vec<RawFeedItem> {
    let mut all_items = Vec::new();
    let mut errors = Vec::new();

    for url in urls {
        match fetcher.fetch_feed(url).await {
            Ok(items) => {
                debug!("Fetched {} items from {}", items.len(), url);
                let source = source_name(url);
                all_items.extend(items.into_iter().map(|mut item| {
                    item.source = Some(source.clone());
                    item
                }));
            }
            Err(e) => {
                error!("Failed to fetch feed '{}': {}", e.url(), e);
                errors.push(e.to_string());
            }
        }
    }

    if all_items.is_empty() {
        if !errors.is_empty() {
            error!("No articles found. Errors: {}", errors.join(", "));
        }
        return all_items;
    }

    if !errors.is_empty() {
        error!(
            "{} sources could not be fetched, {} articles fetched successfully",
            errors.len(),
            all_items.len()
        );
    }

    sort_newest_first(&mut all_items);
    all_items
}

/// Stable sort by publication date, descending. Undated items go last.
pub fn sort_newest_first(items: &mut [RawFeedItem]) {
    items.sort_by(|a, b| match (a.published, b.published) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
