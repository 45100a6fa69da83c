//! # Verse Card Server Library
//!
//! HTTP surface for composing verse cards: session state, the image proxy,
//! random verse lookup and export. This library is used by both the binary
//! and integration tests.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use card_core::EditorStore;
use card_renderer::fontdb;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod proxy;
pub mod routes;
pub mod validation;
pub mod verses;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use proxy::{ImageProxy, ProxyError};
pub use verses::{VerseClient, VerseLookup};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-session editor state.
    pub store: EditorStore,
    /// Outbound image fetcher.
    pub proxy: ImageProxy,
    /// Random verse source.
    pub verses: VerseClient,
    /// Fonts shared by every export.
    pub fonts: Arc<fontdb::Database>,
    /// Effective configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state from configuration, loading system fonts.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let verses = VerseClient::new(&config.verse_base_url, &config.bible_version)?;
        Self::with_parts(config, verses, card_renderer::system_fonts())
    }

    /// Build state with an explicit verse client and font database.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy client cannot be built.
    pub fn with_parts(
        config: ServerConfig,
        verses: VerseClient,
        fonts: Arc<fontdb::Database>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store: EditorStore::new(),
            proxy: ImageProxy::new(&config.proxy_user_agent)?,
            verses,
            fonts,
            config: Arc::new(config),
        })
    }
}

/// Build a CORS layer that only allows localhost origins.
fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Common dev server ports for a separately served front end
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
}

/// Count requests per matched route.
async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;
    metrics::record_http_request(method.as_str(), &route, response.status().as_u16());
    response
}

/// Build the application router.
///
/// The image proxy sets its own permissive `Access-Control-Allow-Origin`
/// and is merged outside the localhost CORS layer.
pub fn app(state: AppState) -> Router {
    let port = state.config.port;

    let api = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/api/verses/random", get(routes::random_verse))
        .route("/api/verses/popular", get(routes::list_popular))
        .route("/api/sessions", post(routes::create_session))
        .route(
            "/api/sessions/{session_id}",
            get(routes::get_session).delete(routes::delete_session),
        )
        .route(
            "/api/sessions/{session_id}/image",
            post(routes::upload_image).delete(routes::remove_image),
        )
        .route(
            "/api/sessions/{session_id}/image/url",
            post(routes::set_image_url),
        )
        .route(
            "/api/sessions/{session_id}/verse",
            post(routes::set_custom_verse),
        )
        .route(
            "/api/sessions/{session_id}/verse/random",
            post(routes::select_random_verse),
        )
        .route(
            "/api/sessions/{session_id}/verse/popular/{index}",
            post(routes::select_popular_verse),
        )
        .route(
            "/api/sessions/{session_id}/preview.svg",
            get(routes::preview),
        )
        .route(
            "/api/sessions/{session_id}/export",
            post(routes::export_card),
        )
        .route("/api/sessions/{session_id}/share", post(routes::share))
        .route_layer(middleware::from_fn(track_requests))
        // CORS configuration - restricted to localhost only
        .layer(build_cors_layer(port));

    let proxy = Router::new()
        .route("/api/image-proxy", get(proxy::image_proxy))
        .route_layer(middleware::from_fn(track_requests));

    api.merge(proxy)
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
