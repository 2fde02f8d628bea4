use chrono::Locale;
use serde::Deserialize;
use std::env::{self, VarError};
use std::path::Path;

pub const DEFAULT_SOURCES_ENV: &str = "MEDIUM_RSS_URLS";

/// Many feed providers reject clients that don't look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/95.0.4638.74 Safari/537.36";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Locale used for long-form article dates, e.g. `tr_TR`
    #[serde(default = "default_locale")]
    pub locale: String,
    /// HTTP client timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Environment variable holding the comma-separated feed URLs
    #[serde(default = "default_sources_env")]
    pub sources_env: String,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_locale() -> String {
    "tr_TR".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_sources_env() -> String {
    DEFAULT_SOURCES_ENV.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            locale: default_locale(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            sources_env: default_sources_env(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply `PORT` and `CORS_ALLOWED_ORIGINS` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = env::var("PORT") {
            let port = port.trim();
            if !port.is_empty() {
                self.bind_addr = format!("0.0.0.0:{port}");
            }
        }
        if let Ok(origins) = env::var("CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = split_list(&origins);
        }
    }

    pub fn locale(&self) -> anyhow::Result<Locale> {
        Locale::try_from(self.locale.as_str())
            .map_err(|_| anyhow::anyhow!("unknown locale '{}'", self.locale))
    }

    pub fn feed_sources(&self) -> FeedSources {
        FeedSources::Env(self.sources_env.clone())
    }
}

/// Where the feed URL list comes from. Resolved again on every request.
#[derive(Debug, Clone)]
pub enum FeedSources {
    /// Read from the named environment variable
    Env(String),
    /// A fixed value, used by tests and embedders
    Fixed(Option<String>),
}

impl FeedSources {
    /// Returns the raw comma-separated list, or `None` when nothing is configured.
    pub fn resolve(&self) -> anyhow::Result<Option<String>> {
        let raw = match self {
            FeedSources::Env(var) => match env::var(var) {
                Ok(value) => Some(value),
                Err(VarError::NotPresent) => None,
                Err(e @ VarError::NotUnicode(_)) => {
                    return Err(anyhow::anyhow!("reading {var}: {e}"));
                }
            },
            FeedSources::Fixed(value) => value.clone(),
        };

        Ok(raw.filter(|value| !value.is_empty()))
    }

    /// Name shown to clients when no sources are configured.
    pub fn label(&self) -> &str {
        match self {
            FeedSources::Env(var) => var,
            FeedSources::Fixed(_) => DEFAULT_SOURCES_ENV,
        }
    }
}

/// Split a comma-separated feed list, trimming entries and dropping blanks.
pub fn parse_feed_urls(raw: &str) -> Vec<String> {
    split_list(raw)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
