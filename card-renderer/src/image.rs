//! Image loading utilities.
//!
//! Decodes background images from raw bytes or base64 data URIs and
//! normalizes them to PNG before they are embedded in a card.

use base64::Engine;
use image::ImageEncoder;

use crate::error::{RenderError, RenderResult};

/// Decoded RGBA image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Original format of the image.
    pub format: ImageFormat,
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// Load an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}

/// Decode the payload of a data URI.
///
/// Supports both `data:image/png;base64,...` and percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded_data)
    }
}

/// Load an image from a data URI.
///
/// # Errors
///
/// Returns an error if the data URI is malformed or the image cannot be decoded.
pub fn load_image_from_data_uri(uri: &str) -> RenderResult<DecodedImage> {
    load_image_from_bytes(&decode_data_uri(uri)?)
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Downscale an image so it still covers `min_width` x `min_height`.
///
/// Cover semantics: the shorter relative side ends up exactly at its minimum.
/// Returns `None` if the image is already small enough.
#[must_use]
pub fn fit_to_cover(img: &DecodedImage, min_width: u32, min_height: u32) -> Option<DecodedImage> {
    let scale_x = f64::from(min_width) / f64::from(img.width.max(1));
    let scale_y = f64::from(min_height) / f64::from(img.height.max(1));
    let scale = scale_x.max(scale_y);

    if scale >= 1.0 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_width = ((f64::from(img.width) * scale).ceil() as u32).max(1);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_height = ((f64::from(img.height) * scale).ceil() as u32).max(1);

    let buffer = image::RgbaImage::from_raw(img.width, img.height, img.data.clone())?;

    let resized = image::imageops::resize(
        &buffer,
        new_width,
        new_height,
        image::imageops::FilterType::Lanczos3,
    );

    Some(DecodedImage {
        width: new_width,
        height: new_height,
        data: resized.into_raw(),
        format: img.format,
    })
}

/// Encode an image as a base64 PNG data URI.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn encode_png_data_uri(img: &DecodedImage) -> RenderResult<String> {
    let mut buf = std::io::Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            &img.data,
            img.width,
            img.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;

    let payload = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
    Ok(format!("data:image/png;base64,{payload}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn solid(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            data: vec![200; (width * height * 4) as usize],
            format: ImageFormat::Unknown,
        }
    }

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(&[1, 2]), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_parsing() {
        let data_uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let img = load_image_from_data_uri(&data_uri).expect("valid data URI");
        assert_eq!(img.width, 1);
        assert_eq!(img.height, 1);
        assert_eq!(img.format, ImageFormat::Png);
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(load_image_from_data_uri("not a data uri").is_err());
        assert!(load_image_from_data_uri("data:image/png").is_err());
        assert!(load_image_from_data_uri("data:image/png;base64,!!!").is_err());
        assert!(load_image_from_data_uri("data:image/png;base64,AQID").is_err());
    }

    #[test]
    fn test_percent_encoded_payload() {
        assert_eq!(decode_data_uri("data:text/plain,a%20b").expect("decoded"), b"a b");
        assert!(decode_data_uri("data:text/plain,a%2").is_err());
    }

    #[test]
    fn test_fit_to_cover_downscales_large_images() {
        let img = solid(400, 100);
        let fitted = fit_to_cover(&img, 100, 50).expect("resized");
        assert_eq!(fitted.height, 50);
        assert_eq!(fitted.width, 200);
        assert_eq!(fitted.data.len(), (200 * 50 * 4) as usize);
    }

    #[test]
    fn test_fit_to_cover_keeps_small_images() {
        let img = solid(50, 50);
        assert!(fit_to_cover(&img, 100, 100).is_none());
    }

    #[test]
    fn test_png_data_uri_round_trip_dimensions() {
        let uri = encode_png_data_uri(&solid(3, 2)).expect("encoded");
        assert!(uri.starts_with("data:image/png;base64,"));
        let img = load_image_from_data_uri(&uri).expect("decoded");
        assert_eq!((img.width, img.height), (3, 2));
    }
}
