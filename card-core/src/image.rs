//! Background image references and upload validation.

use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{CardError, CardResult};

/// Upload ceiling: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A displayable background image.
///
/// Either the uploaded bytes embedded inline, or a remote URL that is fetched
/// through the image proxy when the card is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageRef {
    /// Uploaded image embedded as a `data:` URI.
    Inline {
        /// MIME type declared by the uploader.
        mime: String,
        /// `data:<mime>;base64,<payload>`.
        data_uri: String,
    },
    /// Remote image, fetched server-side on demand.
    Remote {
        /// Absolute http(s) URL.
        url: String,
    },
}

impl ImageRef {
    /// Build an inline reference from raw bytes without validation.
    #[must_use]
    pub fn inline(mime: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::Inline {
            mime: mime.to_string(),
            data_uri: format!("data:{mime};base64,{payload}"),
        }
    }

    /// Build a remote reference.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidImageUrl`] unless `url` is an absolute
    /// http or https URL.
    pub fn remote(url: &str) -> CardResult<Self> {
        let trimmed = url.trim();
        let parsed =
            Url::parse(trimmed).map_err(|e| CardError::InvalidImageUrl(format!("{trimmed}: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => Ok(Self::Remote {
                url: parsed.to_string(),
            }),
            other => Err(CardError::InvalidImageUrl(format!(
                "unsupported scheme {other}"
            ))),
        }
    }

    /// Whether the image needs fetching before it can be rasterized.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// The `href` a renderer should place in the card.
    ///
    /// For remote images this is the proxied path, mirroring what a browser
    /// client loads so that canvas reads stay same-origin.
    #[must_use]
    pub fn href(&self) -> String {
        match self {
            Self::Inline { data_uri, .. } => data_uri.clone(),
            Self::Remote { url } => proxy_path(url),
        }
    }
}

/// Path of the image proxy endpoint for `url`.
#[must_use]
pub fn proxy_path(url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
    format!("/api/image-proxy?url={encoded}")
}

/// Normalize a declared MIME type and check that it names an image.
///
/// Parameters are dropped and the type is lowercased, so
/// `Image/PNG; q=1` becomes `image/png`.
///
/// # Errors
///
/// Returns [`CardError::UnsupportedMediaType`] unless the type starts with
/// `image/`.
pub fn check_media_type(mime: &str) -> CardResult<String> {
    let mime = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime.starts_with("image/") {
        Ok(mime)
    } else if mime.is_empty() {
        Err(CardError::UnsupportedMediaType("no content type".to_string()))
    } else {
        Err(CardError::UnsupportedMediaType(mime))
    }
}

/// Validate an uploaded file and embed it.
///
/// Mirrors the browser file picker rules: the MIME type must start with
/// `image/` and the file must be at most `limit` bytes.
///
/// # Errors
///
/// - [`CardError::UnsupportedMediaType`] for non-image MIME types.
/// - [`CardError::FileTooLarge`] when `bytes.len() > limit`.
/// - [`CardError::EmptyUpload`] for an empty body.
pub fn accept_upload(mime: &str, bytes: &[u8], limit: usize) -> CardResult<ImageRef> {
    let mime = check_media_type(mime)?;

    if bytes.len() > limit {
        return Err(CardError::FileTooLarge {
            size: bytes.len(),
            limit,
        });
    }

    if bytes.is_empty() {
        return Err(CardError::EmptyUpload);
    }

    tracing::debug!(mime = %mime, size = bytes.len(), "accepted image upload");
    Ok(ImageRef::inline(&mime, bytes))
}
