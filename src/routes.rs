use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Locale, Utc};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::aggregator;
use crate::config::{parse_feed_urls, FeedSources};
use crate::fetcher::Fetcher;
use crate::normalize::{normalize, NormalizedArticle};

const FETCHED_MESSAGE: &str = "RSS beslemeleri başarıyla çekildi";
const EMPTY_MESSAGE: &str = "RSS beslemelerinden makale bulunamadı";
const NO_VALID_URL_MESSAGE: &str = "Geçerli RSS URL bulunamadı";
const INTERNAL_ERROR_MESSAGE: &str = "RSS verilerini çekerken bir hata oluştu";
const HEALTH_MESSAGE: &str = "Sistem sağlık durumu başarıyla getirildi.";

pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub sources: FeedSources,
    pub locale: Locale,
    pub cors_allowed_origins: Vec<String>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(fetcher: Arc<Fetcher>, sources: FeedSources, locale: Locale) -> Self {
        Self {
            fetcher,
            sources,
            locale,
            cors_allowed_origins: Vec::new(),
            started_at: Instant::now(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_allowed_origins = origins;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct RssResponse {
    pub success: bool,
    pub message: String,
    pub data: RssData,
    pub count: usize,
    pub sources: usize,
}

#[derive(Debug, Serialize)]
pub struct RssData {
    pub items: Vec<NormalizedArticle>,
}

impl RssResponse {
    fn new(message: &str, items: Vec<NormalizedArticle>, sources: usize) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            count: items.len(),
            data: RssData { items },
            sources,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: HealthData,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: f64,
    pub version: &'static str,
    pub platform: &'static str,
}

// Custom error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Internal(err) => {
                error!("Unexpected error while serving RSS feeds: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError::Internal(err.into())
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/rss", get(rss))
        .route("/health", get(health));

    with_middleware(routes, &state.cors_allowed_origins).with_state(state)
}

fn with_middleware(
    router: Router<Arc<AppState>>,
    cors_allowed_origins: &[String],
) -> Router<Arc<AppState>> {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(build_cors(cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
}

// Route handlers
pub async fn rss(State(state): State<Arc<AppState>>) -> Result<Json<RssResponse>, AppError> {
    let Some(raw) = state.sources.resolve()? else {
        return Err(AppError::BadRequest(format!(
            "RSS beslemesi URL parametreleri gerekli ({})",
            state.sources.label()
        )));
    };

    let urls = parse_feed_urls(&raw);
    if urls.is_empty() {
        return Err(AppError::BadRequest(NO_VALID_URL_MESSAGE.to_string()));
    }

    let items = aggregator::fetch_all(&state.fetcher, &urls).await;
    if items.is_empty() {
        return Ok(Json(RssResponse::new(EMPTY_MESSAGE, Vec::new(), urls.len())));
    }

    let articles: Vec<NormalizedArticle> = items
        .iter()
        .map(|item| normalize(item, state.locale))
        .collect();

    debug!(
        "Fetched RSS feeds: {} articles from {} sources",
        articles.len(),
        urls.len()
    );

    Ok(Json(RssResponse::new(FETCHED_MESSAGE, articles, urls.len())))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check: healthy");

    Json(HealthResponse {
        success: true,
        message: HEALTH_MESSAGE,
        data: HealthData {
            status: "healthy",
            timestamp: Utc::now().to_rfc3339(),
            uptime: state.started_at.elapsed().as_secs_f64(),
            version: env!("CARGO_PKG_VERSION"),
            platform: std::env::consts::OS,
        },
    })
}
