use reqwest::StatusCode;
use thiserror::Error;

/// Failure to fetch or parse a single feed source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not parse feed from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Parse { url, .. } => url,
        }
    }
}
