//! # Verse Card Renderer
//!
//! Turns a composed [`card_core::Card`] into an SVG document and rasterizes it
//! to PNG or JPEG.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌───────────┐    ┌───────────┐
//! │   Card   │ -> │ normalize bg │ -> │  SVG (xml)│ -> │ resvg +   │ -> PNG / JPEG
//! │ (layers) │    │ (PNG data uri│    │           │    │ tiny-skia │
//! └──────────┘    └──────────────┘    └───────────┘    └───────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod image;

pub use error::{RenderError, RenderResult};
pub use export::{
    system_fonts, CardExporter, ExportConfig, ExportFormat, ExportVariant, DEFAULT_EXPORT_SCALE,
};
pub use self::image::{load_image_from_bytes, load_image_from_data_uri, DecodedImage, ImageFormat};

/// Font database shared between exports.
pub use usvg::fontdb;
