use std::path::Path;
use std::sync::Arc;

use tracing::info;

use club_feed::config::Config;
use club_feed::fetcher::Fetcher;
use club_feed::logging;
use club_feed::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    logging::init();

    // Load configuration
    let config_path =
        std::env::var("CLUB_FEED_CONFIG").unwrap_or_else(|_| "club-feed.toml".to_string());
    let mut config = if Path::new(&config_path).exists() {
        info!("Loading configuration from {}", config_path);
        Config::load(&config_path)?
    } else {
        Config::default()
    };
    config.apply_env_overrides();
    let locale = config.locale()?;

    let fetcher = Arc::new(Fetcher::from_config(&config)?);

    // Create app state
    let state = AppState::new(fetcher, config.feed_sources(), locale)
        .with_cors_origins(config.cors_allowed_origins.clone());
    let app = routes::app(Arc::new(state));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Received shutdown signal, stopping server");
}
