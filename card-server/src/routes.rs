//! API route handlers.
//!
//! Every session route validates its id, locks the editor store only for
//! the duration of a synchronous update, and answers with an
//! [`EditorSnapshot`] unless it produces something more specific.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use card_core::{
    check_media_type, download_filename, plan_share, popular_verse, popular_verses, CardError,
    EditorSnapshot, ImageRef, ShareAction, Verse, VerseOrigin,
};
use card_renderer::{CardExporter, ExportConfig, ExportFormat, ExportVariant};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::validation::validate_session_id;
use crate::AppState;

/// Largest accepted export scale.
pub const MAX_EXPORT_SCALE: f32 = 4.0;

fn session_id(id: &str) -> ApiResult<&str> {
    validate_session_id(id)?;
    Ok(id)
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// `POST /api/sessions`: start a fresh session with a random id.
#[tracing::instrument(name = "create_session", skip(state))]
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<EditorSnapshot>) {
    let id = uuid::Uuid::new_v4().to_string();
    tracing::info!(session_id = %id, "session created");
    (StatusCode::CREATED, Json(state.store.create(&id)))
}

/// `GET /api/sessions/{id}`: unknown ids read as an empty session.
#[tracing::instrument(name = "get_session", skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EditorSnapshot>> {
    let id = session_id(&id)?;
    Ok(Json(state.store.snapshot(id)))
}

/// `DELETE /api/sessions/{id}`
#[tracing::instrument(name = "delete_session", skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = session_id(&id)?;
    if state.store.remove(id) {
        tracing::info!(session_id = %id, "session removed");
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Image selection
// ---------------------------------------------------------------------------

/// `POST /api/sessions/{id}/image`: raw image body.
///
/// The declared type is checked before the body is read, so a non-image is
/// always 415 even when it is also too large.
#[tracing::instrument(name = "upload_image", skip(state, headers, body))]
pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<Json<EditorSnapshot>> {
    let id = session_id(&id)?;
    let limit = state.config.max_upload_bytes;

    let result = read_upload(&headers, body, limit).await;
    let image = match result {
        Ok(image) => image,
        Err(err) => {
            metrics::record_upload(upload_outcome(&err));
            return Err(err.into());
        }
    };

    metrics::record_upload("accepted");
    let snapshot = state.store.update(id, |editor| {
        editor.set_image(image);
        editor.snapshot(id)
    });
    tracing::info!(session_id = %id, "image uploaded");
    Ok(Json(snapshot))
}

async fn read_upload(headers: &HeaderMap, body: Body, limit: usize) -> Result<ImageRef, CardError> {
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let mime = check_media_type(declared)?;

    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(size) = declared_len.filter(|size| *size > limit) {
        return Err(CardError::FileTooLarge { size, limit });
    }

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| CardError::FileTooLarge {
            size: declared_len.unwrap_or(limit.saturating_add(1)),
            limit,
        })?;

    card_core::accept_upload(&mime, &bytes, limit)
}

fn upload_outcome(err: &CardError) -> &'static str {
    match err {
        CardError::UnsupportedMediaType(_) => "unsupported_media_type",
        CardError::FileTooLarge { .. } => "too_large",
        CardError::EmptyUpload => "empty",
        _ => "rejected",
    }
}

/// Body of `POST /api/sessions/{id}/image/url`.
#[derive(Debug, Deserialize)]
pub struct ImageUrlRequest {
    /// Absolute http(s) URL.
    pub url: String,
}

/// `POST /api/sessions/{id}/image/url`: use a remote image as background.
#[tracing::instrument(name = "set_image_url", skip(state))]
pub async fn set_image_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ImageUrlRequest>,
) -> ApiResult<Json<EditorSnapshot>> {
    let id = session_id(&id)?;
    let image = ImageRef::remote(&request.url)?;
    Ok(Json(state.store.update(id, |editor| {
        editor.set_image(image);
        editor.snapshot(id)
    })))
}

/// `DELETE /api/sessions/{id}/image`
#[tracing::instrument(name = "remove_image", skip(state))]
pub async fn remove_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EditorSnapshot>> {
    let id = session_id(&id)?;
    let snapshot = state.store.update_existing(id, |editor| {
        if editor.remove_image() {
            tracing::info!(session_id = %id, "image removed");
        }
        editor.snapshot(id)
    });
    Ok(Json(snapshot.unwrap_or_else(|| state.store.snapshot(id))))
}

// ---------------------------------------------------------------------------
// Verse selection
// ---------------------------------------------------------------------------

/// A verse with where it came from and the notice to show.
#[derive(Debug, Serialize)]
pub struct VerseResponse {
    /// The verse.
    pub verse: Verse,
    /// `remote` or `fallback`.
    pub origin: VerseOrigin,
    /// Toast text for the outcome.
    pub notice: &'static str,
}

/// Session state after a random pick.
#[derive(Debug, Serialize)]
pub struct RandomVerseResponse {
    /// Updated session.
    pub snapshot: EditorSnapshot,
    /// `remote` or `fallback`.
    pub origin: VerseOrigin,
    /// Toast text for the outcome.
    pub notice: &'static str,
}

/// `GET /api/verses/random`: look up a verse without touching any session.
#[tracing::instrument(name = "random_verse", skip(state))]
pub async fn random_verse(State(state): State<AppState>) -> Json<VerseResponse> {
    let lookup = state.verses.random_verse().await;
    let notice = lookup.notice();
    Json(VerseResponse {
        verse: lookup.verse,
        origin: lookup.origin,
        notice,
    })
}

/// `GET /api/verses/popular`
pub async fn list_popular() -> Json<Vec<Verse>> {
    Json(popular_verses())
}

/// Body of `POST /api/sessions/{id}/verse`.
#[derive(Debug, Deserialize)]
pub struct CustomVerseRequest {
    /// Verse text; must not be blank.
    pub text: String,
    /// Reference; blank or missing becomes "Custom Verse".
    #[serde(default)]
    pub reference: Option<String>,
}

/// `POST /api/sessions/{id}/verse`: custom verse.
#[tracing::instrument(name = "set_custom_verse", skip(state, request))]
pub async fn set_custom_verse(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CustomVerseRequest>,
) -> ApiResult<Json<EditorSnapshot>> {
    let id = session_id(&id)?;
    let verse = Verse::custom(&request.text, request.reference.as_deref())?;
    tracing::info!(session_id = %id, reference = %verse.reference, "custom verse added");
    Ok(Json(state.store.update(id, |editor| {
        editor.set_verse(verse, VerseOrigin::Custom);
        editor.snapshot(id)
    })))
}

/// `POST /api/sessions/{id}/verse/random`
#[tracing::instrument(name = "select_random_verse", skip(state))]
pub async fn select_random_verse(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RandomVerseResponse>> {
    let id = session_id(&id)?.to_string();
    let lookup = state.verses.random_verse().await;
    let notice = lookup.notice();
    let origin = lookup.origin;
    let snapshot = state.store.update(&id, |editor| {
        editor.set_verse(lookup.verse, origin);
        editor.snapshot(&id)
    });
    Ok(Json(RandomVerseResponse {
        snapshot,
        origin,
        notice,
    }))
}

/// `POST /api/sessions/{id}/verse/popular/{index}`
#[tracing::instrument(name = "select_popular_verse", skip(state))]
pub async fn select_popular_verse(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> ApiResult<Json<EditorSnapshot>> {
    let id = session_id(&id)?;
    let verse = popular_verse(index)?;
    Ok(Json(state.store.update(id, |editor| {
        editor.set_verse(verse, VerseOrigin::Popular);
        editor.snapshot(id)
    })))
}

// ---------------------------------------------------------------------------
// Preview, export and share
// ---------------------------------------------------------------------------

/// `GET /api/sessions/{id}/preview.svg`: the live card at CSS size.
#[tracing::instrument(name = "preview", skip(state))]
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = session_id(&id)?;
    let card = state.store.get_or_empty(id).card();
    let exporter = CardExporter::new(
        ExportConfig::default().with_scale(1.0),
        Arc::clone(&state.fonts),
    );
    let svg = exporter.render_to_svg(&card);
    Ok((
        [
            (header::CONTENT_TYPE, ExportFormat::Svg.mime()),
            (header::CACHE_CONTROL, "no-store"),
        ],
        svg,
    )
        .into_response())
}

/// Body of `POST /api/sessions/{id}/export`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    /// Rasterization flavour, `canvas` by default.
    pub variant: Option<ExportVariant>,
    /// Output format, `png` by default.
    pub format: Option<ExportFormat>,
    /// Upscale factor; the server default when absent.
    pub scale: Option<f32>,
}

/// `POST /api/sessions/{id}/export`: render the card and return it as a download.
#[tracing::instrument(name = "export_card", skip(state, request))]
pub async fn export_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<Response> {
    let id = session_id(&id)?;
    let variant = request.variant.unwrap_or_default();
    let format = request.format.unwrap_or_default();

    let permit = match state.store.begin_export(id) {
        Ok(permit) => permit,
        Err(err) => {
            let outcome = if err == CardError::ExportInProgress {
                "busy"
            } else {
                "no_verse"
            };
            metrics::record_export(variant.as_str(), outcome);
            return Err(err.into());
        }
    };

    let result = render_export(&state, &permit, variant, format, request.scale).await;
    let filename = download_filename(&permit.verse().reference, format.extension());
    drop(permit);

    match result {
        Ok(bytes) => {
            metrics::record_export(variant.as_str(), "ok");
            tracing::info!(
                session_id = %id,
                variant = variant.as_str(),
                size = bytes.len(),
                filename = %filename,
                "card exported"
            );
            Ok((
                [
                    (header::CONTENT_TYPE, format.mime().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response())
        }
        Err(err) => {
            metrics::record_export(variant.as_str(), "failed");
            Err(err)
        }
    }
}

async fn render_export(
    state: &AppState,
    permit: &card_core::ExportPermit,
    variant: ExportVariant,
    format: ExportFormat,
    scale: Option<f32>,
) -> ApiResult<Vec<u8>> {
    let card = match permit.image() {
        Some(ImageRef::Remote { url }) => {
            let fetched = state.proxy.fetch(url).await?;
            let inline = ImageRef::inline(&fetched.content_type, &fetched.bytes);
            permit.card().with_background_href(inline.href())
        }
        _ => permit.card().clone(),
    };

    let scale = scale
        .unwrap_or(state.config.export_scale)
        .min(MAX_EXPORT_SCALE);
    let exporter = CardExporter::new(
        ExportConfig::for_variant(variant).with_scale(scale),
        Arc::clone(&state.fonts),
    );

    tokio::task::spawn_blocking(move || exporter.export(&card, format))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::from)
}

/// Body of `POST /api/sessions/{id}/share`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShareRequest {
    /// Whether the client can open a native share sheet.
    pub native_supported: bool,
    /// URL of the page to link back to.
    pub page_url: String,
}

/// `POST /api/sessions/{id}/share`
#[tracing::instrument(name = "share", skip(state, request))]
pub async fn share(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ShareRequest>,
) -> ApiResult<Json<ShareAction>> {
    let id = session_id(&id)?;
    let editor = state.store.get_or_empty(id);
    let action = plan_share(editor.verse(), &request.page_url, request.native_supported)?;
    metrics::record_share(&action);
    Ok(Json(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_outcome_labels() {
        assert_eq!(
            upload_outcome(&CardError::UnsupportedMediaType("x".into())),
            "unsupported_media_type"
        );
        assert_eq!(
            upload_outcome(&CardError::FileTooLarge { size: 2, limit: 1 }),
            "too_large"
        );
        assert_eq!(upload_outcome(&CardError::EmptyUpload), "empty");
    }

    #[test]
    fn test_export_request_defaults() {
        let request: ExportRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(request.variant.unwrap_or_default(), ExportVariant::Canvas);
        assert_eq!(request.format.unwrap_or_default(), ExportFormat::Png);
        assert!(request.scale.is_none());

        let request: ExportRequest =
            serde_json::from_str(r#"{"variant":"dom_to_image","format":"jpeg"}"#).expect("parse");
        assert_eq!(request.variant, Some(ExportVariant::DomToImage));
        assert_eq!(request.format, Some(ExportFormat::Jpeg));
    }

    #[tokio::test]
    async fn test_read_upload_rejects_declared_oversize() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "image/png".parse().expect("header"));
        headers.insert(header::CONTENT_LENGTH, "100".parse().expect("header"));
        let err = read_upload(&headers, Body::from(vec![0u8; 100]), 10)
            .await
            .expect_err("too large");
        assert_eq!(err, CardError::FileTooLarge { size: 100, limit: 10 });
    }

    #[tokio::test]
    async fn test_read_upload_checks_type_first() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().expect("header"));
        let err = read_upload(&headers, Body::from(vec![0u8; 100]), 10)
            .await
            .expect_err("not an image");
        assert!(matches!(err, CardError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn test_read_upload_streamed_oversize() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "image/png".parse().expect("header"));
        let err = read_upload(&headers, Body::from(vec![0u8; 11]), 10)
            .await
            .expect_err("too large");
        assert!(matches!(err, CardError::FileTooLarge { limit: 10, .. }));
    }
}
