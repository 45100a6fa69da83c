//! Health check endpoints for Kubernetes probes.
//!
//! Provides liveness and readiness probes for container orchestration:
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe (remove from LB if fails)
//! - `/health` - Combined check for backward compatibility

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
///
/// Only `verse_url_valid` decides readiness. It is a configuration check and
/// never contacts the dataset.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Live editor sessions (informational)
    pub sessions: usize,
    /// Configured verse dataset URL is an http(s) URL
    pub verse_url_valid: bool,
    /// Font faces available to the renderer (informational; zero means text
    /// is skipped in exports)
    pub font_faces: usize,
}

/// Liveness probe - is the server running?
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - is the server ready to accept traffic?
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let sessions = state.store.len();
    let all_ok = verse_url_valid(&state.config.verse_base_url);

    tracing::debug!(sessions, verse_url_valid = all_ok, "readiness checked");

    let status = HealthStatus {
        status: if all_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            sessions,
            verse_url_valid: all_ok,
            font_faces: state.fonts.len(),
        },
    };

    let code = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

fn verse_url_valid(base: &str) -> bool {
    url::Url::parse(base).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy",
            version: "0.1.0",
            checks: HealthChecks {
                sessions: 3,
                verse_url_valid: true,
                font_faces: 12,
            },
        };

        let json = serde_json::to_string(&status).expect("should serialize");
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
        assert!(json.contains("\"sessions\":3"));
        assert!(json.contains("\"font_faces\":12"));
    }

    #[test]
    fn test_health_status_unhealthy() {
        let status = HealthStatus {
            status: "unhealthy",
            version: "0.1.0",
            checks: HealthChecks {
                sessions: 0,
                verse_url_valid: false,
                font_faces: 0,
            },
        };

        let json = serde_json::to_string(&status).expect("should serialize");
        assert!(json.contains("unhealthy"));
        assert!(json.contains("\"verse_url_valid\":false"));
    }

    #[test]
    fn test_verse_url_validity() {
        assert!(verse_url_valid("https://cdn.jsdelivr.net/gh/wldeh/bible-api/bibles"));
        assert!(verse_url_valid("http://127.0.0.1:9/bibles"));
        assert!(!verse_url_valid("not a url"));
        assert!(!verse_url_valid("ftp://example.com/bibles"));
    }
}
