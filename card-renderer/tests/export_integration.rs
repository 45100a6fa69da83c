//! Integration tests for card export (card-renderer).
//!
//! Exercises the full compose -> SVG -> raster pipeline with real photo
//! payloads and both rasterization variants.

use std::sync::Arc;

use card_core::{compose, ImageRef, Verse};
use card_renderer::{fontdb, CardExporter, ExportConfig, ExportFormat, ExportVariant};
use image::{ImageEncoder, RgbImage};

fn exporter(variant: ExportVariant) -> CardExporter {
    CardExporter::new(
        ExportConfig::for_variant(variant),
        Arc::new(fontdb::Database::new()),
    )
}

/// A JPEG photo larger than the export resolution.
fn large_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            u8::try_from(x % 256).unwrap_or(0),
            u8::try_from(y % 256).unwrap_or(0),
            128,
        ])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 80)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .expect("encode jpeg");
    buf.into_inner()
}

fn long_verse() -> Verse {
    Verse::new(
        "For God so loved the world, that he gave his only begotten Son, that whosoever \
         believeth in him should not perish, but have everlasting life.",
        "John 3:16",
    )
}

#[test]
fn test_photo_card_png_at_double_scale() {
    let photo = ImageRef::inline("image/jpeg", &large_jpeg(1600, 1200));
    let card = compose(Some(&photo), Some(&long_verse()));

    let png = exporter(ExportVariant::Canvas)
        .export(&card, ExportFormat::Png)
        .expect("png");

    let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (896, 1120));
    // The photo fills the card body.
    assert_eq!(decoded.get_pixel(448, 560)[3], 255);
}

#[test]
fn test_dom_to_image_fills_corners_with_dark_background() {
    let photo = ImageRef::inline("image/jpeg", &large_jpeg(640, 800));
    let card = compose(Some(&photo), Some(&long_verse()));

    let png = exporter(ExportVariant::DomToImage)
        .export(&card, ExportFormat::Png)
        .expect("png");

    let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [0x17, 0x17, 0x17, 0xFF]);
}

#[test]
fn test_canvas_variant_leaves_corners_translucent() {
    let card = compose(None, Some(&long_verse()));

    let png = exporter(ExportVariant::Canvas)
        .export(&card, ExportFormat::Png)
        .expect("png");

    let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
    assert!(decoded.get_pixel(0, 0)[3] < 255);
}

#[test]
fn test_all_formats_for_same_card() {
    let card = compose(None, Some(&long_verse()));
    let exporter = exporter(ExportVariant::Canvas);

    let png = exporter.export(&card, ExportFormat::Png).expect("png");
    assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);

    let jpeg = exporter.export(&card, ExportFormat::Jpeg).expect("jpeg");
    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

    let svg = exporter.export(&card, ExportFormat::Svg).expect("svg");
    let svg = String::from_utf8(svg).expect("utf8");
    assert!(svg.contains("John 3:16"));
}

#[test]
fn test_placeholder_card_exports() {
    let card = compose(None, None);
    let png = exporter(ExportVariant::Canvas)
        .export(&card, ExportFormat::Png)
        .expect("placeholder png");
    assert!(png.len() > 8);
}

#[test]
fn test_custom_scale() {
    let card = compose(None, Some(&long_verse()));
    let exporter = CardExporter::new(
        ExportConfig::default().with_scale(1.0),
        Arc::new(fontdb::Database::new()),
    );
    let png = exporter.export(&card, ExportFormat::Png).expect("png");
    let decoded = image::load_from_memory(&png).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (448, 560));
}
