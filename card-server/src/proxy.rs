//! Same-origin image proxy.
//!
//! Fetches a remote image server-side and relays its bytes so a browser
//! canvas can read the pixels without tripping CORS taint rules. The same
//! fetch routine resolves remote backgrounds before export.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::metrics;
use crate::AppState;

/// Content type assumed when the upstream omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Errors raised by the image proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No `url` query parameter, or an empty one.
    #[error("Missing url")]
    MissingUrl,
    /// The upstream answered with a non-success status.
    #[error("Failed to fetch image")]
    UpstreamStatus(u16),
    /// The URL was unusable or the request failed in transit.
    #[error("Proxy failed")]
    Transport(String),
}

impl ProxyError {
    /// HTTP status the proxy endpoint answers with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl => StatusCode::BAD_REQUEST,
            Self::UpstreamStatus(_) | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MissingUrl => "missing_url",
            Self::UpstreamStatus(_) => "upstream_status",
            Self::Transport(_) => "transport",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Bytes fetched from an upstream image host.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// Body exactly as received.
    pub bytes: Bytes,
    /// Upstream `Content-Type`, or [`DEFAULT_CONTENT_TYPE`].
    pub content_type: String,
}

/// HTTP client for fetching remote images.
#[derive(Debug, Clone)]
pub struct ImageProxy {
    http: Client,
}

impl ImageProxy {
    /// Create a proxy that identifies itself with `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Transport`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str) -> Result<Self, ProxyError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProxyError::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    /// Fetch `url` and return its body and content type.
    ///
    /// # Errors
    ///
    /// See [`ProxyError`]. Nothing is retried.
    #[tracing::instrument(name = "proxy_fetch", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, ProxyError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ProxyError::MissingUrl);
        }

        let parsed = Url::parse(url).map_err(|e| ProxyError::Transport(e.to_string()))?;
        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;

        tracing::debug!(size = bytes.len(), content_type = %content_type, "fetched upstream image");
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// Query parameters for the proxy endpoint.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    /// Absolute URL of the image to fetch.
    pub url: Option<String>,
}

/// `GET /api/image-proxy?url=...`
#[tracing::instrument(name = "image_proxy", skip(state))]
pub async fn image_proxy(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Response {
    let url = params.url.unwrap_or_default();
    match state.proxy.fetch(&url).await {
        Ok(image) => {
            metrics::record_proxy_request("ok");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, image.content_type),
                    (header::CACHE_CONTROL, "no-store".to_string()),
                    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
                ],
                image.bytes,
            )
                .into_response()
        }
        Err(err) => {
            metrics::record_proxy_request(err.outcome());
            match &err {
                ProxyError::MissingUrl => tracing::debug!("proxy request without url"),
                ProxyError::UpstreamStatus(status) => {
                    tracing::warn!(status, url = %url, "upstream image fetch failed");
                }
                ProxyError::Transport(reason) => {
                    tracing::error!(reason = %reason, url = %url, "image proxy failed");
                }
            }
            err.into_response()
        }
    }
}
