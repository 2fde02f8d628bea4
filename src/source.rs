//! Display names for feed sources.

use url::Url;

pub const UNKNOWN_SOURCE: &str = "Bilinmeyen Kaynak";

const MEDIUM_FEED_MARKER: &str = "medium.com/feed/";

/// Derive the human-readable source tag for a feed URL.
///
/// Medium user feeds (`https://medium.com/feed/@jane-doe`) are named after the
/// handle (`Jane Doe`); any other feed is named after its host without a
/// leading `www.`.
pub fn source_name(url: &str) -> String {
    if let Some(idx) = url.find(MEDIUM_FEED_MARKER) {
        let handle = &url[idx + MEDIUM_FEED_MARKER.len()..];
        if !handle.is_empty() {
            return title_case(&handle.replacen('@', "", 1).replace('-', " "));
        }
    }

    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => UNKNOWN_SOURCE.to_string(),
        },
        Err(_) => UNKNOWN_SOURCE.to_string(),
    }
}

/// Upper-case every ASCII word character that begins a word.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_word = false;
    for ch in text.chars() {
        let is_word = ch.is_ascii_alphanumeric() || ch == '_';
        if is_word && !prev_is_word {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        prev_is_word = is_word;
    }
    out
}
