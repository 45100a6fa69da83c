//! Prometheus metrics for card-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use axum::{extract::State, response::IntoResponse};
use card_core::{ShareAction, VerseOrigin};
use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const HTTP_REQUESTS_TOTAL: &str = "versecard_http_requests_total";
const PROXY_REQUESTS_TOTAL: &str = "versecard_proxy_requests_total";
const VERSE_LOOKUPS_TOTAL: &str = "versecard_verse_lookups_total";
const UPLOADS_TOTAL: &str = "versecard_uploads_total";
const EXPORTS_TOTAL: &str = "versecard_exports_total";
const SHARES_TOTAL: &str = "versecard_shares_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

/// Record an HTTP request.
///
/// # Arguments
///
/// * `method` - HTTP method (GET, POST, etc.)
/// * `route` - Matched route template, not the raw path
/// * `status` - HTTP status code
pub fn record_http_request(method: &str, route: &str, status: u16) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an image proxy request by outcome (`ok`, `missing_url`, ...).
pub fn record_proxy_request(outcome: &'static str) {
    counter!(PROXY_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a random verse lookup by where the verse came from.
pub fn record_verse_lookup(origin: VerseOrigin) {
    let origin = match origin {
        VerseOrigin::Remote => "remote",
        VerseOrigin::Fallback => "fallback",
        VerseOrigin::Popular => "popular",
        VerseOrigin::Custom => "custom",
    };
    counter!(VERSE_LOOKUPS_TOTAL, "origin" => origin).increment(1);
}

/// Record an upload attempt (`accepted`, `unsupported_media_type`, ...).
pub fn record_upload(outcome: &'static str) {
    counter!(UPLOADS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record an export attempt.
///
/// # Arguments
///
/// * `variant` - `canvas` or `dom_to_image`
/// * `outcome` - `ok`, `no_verse`, `busy` or `failed`
pub fn record_export(variant: &'static str, outcome: &'static str) {
    counter!(
        EXPORTS_TOTAL,
        "variant" => variant,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record which share path was chosen.
pub fn record_share(action: &ShareAction) {
    let action = match action {
        ShareAction::Native(_) => "native",
        ShareAction::Clipboard { .. } => "clipboard",
    };
    counter!(SHARES_TOTAL, "action" => action).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without an installed recorder these are no-ops; they must not panic.
    #[test]
    fn test_recording_without_recorder() {
        record_http_request("GET", "/health", 200);
        record_proxy_request("ok");
        record_verse_lookup(VerseOrigin::Fallback);
        record_upload("accepted");
        record_export("canvas", "ok");
        record_share(&ShareAction::Clipboard {
            text: "t".to_string(),
        });
    }
}
