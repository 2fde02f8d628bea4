use std::fmt;

use chrono::Local;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `dd.mm.yyyy HH:MM` in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortLocalTime;

impl FormatTime for ShortLocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%d.%m.%Y %H:%M"))
    }
}

/// Filter used when `RUST_LOG` is not set: `LOG_LEVEL` (default `info`)
/// for this crate and the HTTP trace layer.
pub fn default_filter(log_level: Option<&str>) -> String {
    let level = log_level
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("info");
    format!("club_feed={level},tower_http={level}")
}

pub fn init() {
    let log_level = std::env::var("LOG_LEVEL").ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(log_level.as_deref()).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_timer(ShortLocalTime))
        .init();
}
