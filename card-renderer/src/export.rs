//! Card export to image formats.
//!
//! Renders a composed [`Card`] to an SVG intermediate representation and
//! rasterizes it with resvg/tiny-skia at an upscaled resolution.

use std::fmt::Write;
use std::sync::Arc;

use card_core::card::{
    Background, Card, Color, Content, Decoration, Gradient, GradientDirection, PlaceholderBlock,
    VerseBlock,
};
use card_core::CARD_ELEMENT_ID;
use image::ImageEncoder;
use serde::{Deserialize, Serialize};
use usvg::fontdb;

use crate::error::{RenderError, RenderResult};
use crate::image::{encode_png_data_uri, fit_to_cover, load_image_from_data_uri};

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image, flattened onto the export background.
    Jpeg,
    /// SVG vector graphics (the XML string as UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// MIME type of the encoded output.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }

    /// File extension for downloads.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
        }
    }
}

/// Which rasterization flavour to imitate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportVariant {
    /// Canvas rasterization: transparent background, decorations kept.
    #[default]
    Canvas,
    /// DOM-to-image: decorations stripped, dark background.
    DomToImage,
}

impl ExportVariant {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::DomToImage => "dom_to_image",
        }
    }
}

/// Default upscale factor applied to exports.
pub const DEFAULT_EXPORT_SCALE: f32 = 2.0;

/// Background used by the DOM-to-image variant.
pub const DOM_TO_IMAGE_BACKGROUND: [u8; 4] = [0x17, 0x17, 0x17, 0xFF];

/// Configuration for card export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Scale factor applied to the card's CSS size.
    pub scale: f32,
    /// Background color as RGBA bytes; `None` leaves it transparent.
    pub background: Option<[u8; 4]>,
    /// Whether decorative borders, shadows and ornaments are drawn.
    pub keep_decorations: bool,
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::for_variant(ExportVariant::Canvas)
    }
}

impl ExportConfig {
    /// Settings matching a rasterization variant.
    #[must_use]
    pub fn for_variant(variant: ExportVariant) -> Self {
        match variant {
            ExportVariant::Canvas => Self {
                scale: DEFAULT_EXPORT_SCALE,
                background: None,
                keep_decorations: true,
                jpeg_quality: 92,
            },
            ExportVariant::DomToImage => Self {
                scale: DEFAULT_EXPORT_SCALE,
                background: Some(DOM_TO_IMAGE_BACKGROUND),
                keep_decorations: false,
                jpeg_quality: 100,
            },
        }
    }

    /// Same settings with a different scale. Non-positive or non-finite
    /// values fall back to 1.0.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        self
    }
}

/// Load the system font database used for text rendering.
#[must_use]
pub fn system_fonts() -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
}

/// Exports a [`Card`] to image formats.
pub struct CardExporter {
    config: ExportConfig,
    fonts: Arc<fontdb::Database>,
}

impl CardExporter {
    /// Create an exporter that shares an already-loaded font database.
    #[must_use]
    pub fn new(config: ExportConfig, fonts: Arc<fontdb::Database>) -> Self {
        Self { config, fonts }
    }

    /// Export a card to the specified format.
    ///
    /// The background photo, if any, must already be an inline `data:` URI.
    ///
    /// # Errors
    ///
    /// - [`RenderError::CardNotFound`] if the card is not the tagged verse card.
    /// - [`RenderError::Resource`] if the background cannot be decoded.
    /// - [`RenderError::Export`] if rasterization or encoding fails.
    pub fn export(&self, card: &Card, format: ExportFormat) -> RenderResult<Vec<u8>> {
        let card = self.prepare(card)?;
        match format {
            ExportFormat::Png => self.render_to_png(&card),
            ExportFormat::Jpeg => self.render_to_jpeg(&card),
            ExportFormat::Svg => Ok(self.render_to_svg(&card).into_bytes()),
        }
    }

    /// Locate the card, strip decorations if configured, and normalize the
    /// background photo to an appropriately sized PNG.
    fn prepare(&self, card: &Card) -> RenderResult<Card> {
        if card.id != CARD_ELEMENT_ID {
            return Err(RenderError::CardNotFound {
                expected: CARD_ELEMENT_ID,
                found: card.id.clone(),
            });
        }

        let card = if self.config.keep_decorations {
            card.clone()
        } else {
            card.without_decorations()
        };

        let Background::Image { href } = &card.background else {
            return Ok(card);
        };

        if !href.starts_with("data:") {
            return Err(RenderError::Resource(
                "background image must be inline data before export".to_string(),
            ));
        }

        let decoded = load_image_from_data_uri(href)?;
        let (out_w, out_h) = self.output_dimensions(&card);
        let normalized = match fit_to_cover(&decoded, out_w, out_h) {
            Some(resized) => encode_png_data_uri(&resized)?,
            None => encode_png_data_uri(&decoded)?,
        };

        Ok(card.with_background_href(normalized))
    }

    /// Export the card to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_png(&self, card: &Card) -> RenderResult<Vec<u8>> {
        let pixmap = self.rasterize(card)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Export the card to JPEG bytes, flattened onto the export background
    /// (white when transparent).
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, card: &Card) -> RenderResult<Vec<u8>> {
        let pixmap = self.rasterize(card)?;

        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = self.config.background.unwrap_or([255, 255, 255, 255]);
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        // tiny-skia stores premultiplied alpha.
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for channel in 0..3 {
                let value = f32::from(bg[channel]).mul_add(inv, f32::from(pixel[channel]));
                rgb_data.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Render the card to an SVG string.
    ///
    /// Image hrefs are emitted as-is, so a browser can display a preview that
    /// still points at the image proxy.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn render_to_svg(&self, card: &Card) -> String {
        let (out_w, out_h) = self.output_dimensions(card);
        let (w, h) = (card.width, card.height);

        let mut svg = String::with_capacity(8192);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"{}\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {w} {h}\">",
            escape_xml(&card.id),
        );

        render_defs(&mut svg, card);

        if let Some(bg) = self.config.background {
            let _ = write!(
                svg,
                "<rect width=\"{w}\" height=\"{h}\" fill=\"rgb({},{},{})\" fill-opacity=\"{}\"/>",
                bg[0],
                bg[1],
                bg[2],
                f32::from(bg[3]) / 255.0,
            );
        }

        for decoration in &card.decorations {
            if let Decoration::Shadow { .. } = decoration {
                let _ = write!(
                    svg,
                    "<rect width=\"{w}\" height=\"{h}\" rx=\"{r}\" fill=\"#000000\" fill-opacity=\"0.25\" filter=\"url(#card-shadow)\"/>",
                    r = card.corner_radius,
                );
            }
        }

        svg.push_str("<g clip-path=\"url(#card-clip)\">");
        render_background(&mut svg, card);
        for idx in 0..card.overlays.len() {
            let _ = write!(
                svg,
                "<rect width=\"{w}\" height=\"{h}\" fill=\"url(#overlay-{idx})\"/>",
            );
        }
        for decoration in &card.decorations {
            render_decoration(&mut svg, card, decoration);
        }
        match &card.content {
            Content::Verse(block) => render_verse_block(&mut svg, card, block),
            Content::Placeholder(block) => render_placeholder(&mut svg, card, block),
        }
        svg.push_str("</g>");

        for decoration in &card.decorations {
            if let Decoration::BorderGlow { color } = decoration {
                let _ = write!(
                    svg,
                    "<rect x=\"0.5\" y=\"0.5\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"1\"/>",
                    w - 1.0,
                    h - 1.0,
                    card.corner_radius,
                    color.hex(),
                    color.a,
                );
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Output dimensions (width, height) in pixels.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn output_dimensions(&self, card: &Card) -> (u32, u32) {
        let out_w = (card.width.max(1.0) * self.config.scale).round() as u32;
        let out_h = (card.height.max(1.0) * self.config.scale).round() as u32;
        (out_w.max(1), out_h.max(1))
    }

    /// Rasterize a card to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize(&self, card: &Card) -> RenderResult<tiny_skia::Pixmap> {
        let svg_string = self.render_to_svg(card);

        let opt = usvg::Options {
            fontdb: Arc::clone(&self.fonts),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        tracing::debug!(width = px_w, height = px_h, "rasterized card");
        Ok(pixmap)
    }
}

fn render_defs(svg: &mut String, card: &Card) {
    svg.push_str("<defs>");
    let _ = write!(
        svg,
        "<clipPath id=\"card-clip\"><rect width=\"{}\" height=\"{}\" rx=\"{}\"/></clipPath>",
        card.width, card.height, card.corner_radius,
    );

    if let Background::Placeholder { gradient } = &card.background {
        render_gradient_def(svg, "background-gradient", gradient);
    }
    for (idx, overlay) in card.overlays.iter().enumerate() {
        render_gradient_def(svg, &format!("overlay-{idx}"), overlay);
    }

    for decoration in &card.decorations {
        match decoration {
            Decoration::Shadow { blur } => {
                let _ = write!(
                    svg,
                    "<filter id=\"card-shadow\" x=\"-20%\" y=\"-20%\" width=\"140%\" height=\"140%\"><feGaussianBlur stdDeviation=\"{blur}\"/></filter>",
                );
            }
            Decoration::CornerAccent { .. } => {
                let accent = Color::ACCENT;
                let _ = write!(
                    svg,
                    "<linearGradient id=\"corner-gradient\" x1=\"1\" y1=\"1\" x2=\"0\" y2=\"0\"><stop offset=\"0\" stop-color=\"{0}\" stop-opacity=\"0.2\"/><stop offset=\"1\" stop-color=\"{0}\" stop-opacity=\"0\"/></linearGradient>",
                    accent.hex(),
                );
            }
            _ => {}
        }
    }
    svg.push_str("</defs>");
}

fn render_gradient_def(svg: &mut String, id: &str, gradient: &Gradient) {
    let (x1, y1, x2, y2) = match gradient.direction {
        GradientDirection::ToTop => (0, 1, 0, 0),
        GradientDirection::ToBottomRight => (0, 0, 1, 1),
    };
    let _ = write!(
        svg,
        "<linearGradient id=\"{id}\" x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\">",
    );
    for stop in &gradient.stops {
        let _ = write!(
            svg,
            "<stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{}\"/>",
            stop.offset,
            stop.color.hex(),
            stop.color.a,
        );
    }
    svg.push_str("</linearGradient>");
}

fn render_background(svg: &mut String, card: &Card) {
    match &card.background {
        Background::Image { href } => {
            let _ = write!(
                svg,
                "<image width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" href=\"{}\"/>",
                card.width,
                card.height,
                escape_xml(href),
            );
        }
        Background::Placeholder { .. } => {
            let _ = write!(
                svg,
                "<rect width=\"{}\" height=\"{}\" fill=\"url(#background-gradient)\"/>",
                card.width, card.height,
            );
        }
    }
}

fn render_decoration(svg: &mut String, card: &Card, decoration: &Decoration) {
    match *decoration {
        Decoration::Sparkle {
            x,
            y,
            size,
            opacity,
        } => {
            let _ = write!(
                svg,
                "<path d=\"M{x},{top} Q{x},{y} {right},{y} Q{x},{y} {x},{bottom} Q{x},{y} {left},{y} Q{x},{y} {x},{top} Z\" fill=\"#ffffff\" fill-opacity=\"{opacity}\"/>",
                top = y - size,
                bottom = y + size,
                left = x - size,
                right = x + size,
            );
        }
        Decoration::QuoteMark {
            x,
            y,
            size,
            opacity,
        } => {
            let _ = write!(
                svg,
                "<text x=\"{x}\" y=\"{y}\" font-size=\"{size}\" font-family=\"serif\" fill=\"#ffffff\" fill-opacity=\"{opacity}\">\u{201c}</text>",
            );
        }
        Decoration::Heart {
            x,
            y,
            size,
            opacity,
        } => {
            let s = size / 2.0;
            let _ = write!(
                svg,
                "<path d=\"M{x},{bottom} C{l2},{mid} {left},{top} {x},{notch} C{right},{top} {r2},{mid} {x},{bottom} Z\" fill=\"{color}\" fill-opacity=\"{opacity}\"/>",
                bottom = y + s,
                mid = y,
                top = y - s * 1.2,
                notch = y - s * 0.4,
                left = x - s * 1.2,
                right = x + s * 1.2,
                l2 = x - s * 1.4,
                r2 = x + s * 1.4,
                color = Color::ACCENT.hex(),
            );
        }
        Decoration::CornerAccent { size } => {
            let (w, h) = (card.width, card.height);
            let _ = write!(
                svg,
                "<path d=\"M{w},{h} L{left},{h} A{size},{size} 0 0 1 {w},{top} Z\" fill=\"url(#corner-gradient)\"/>",
                left = w - size,
                top = h - size,
            );
        }
        Decoration::BorderGlow { .. } | Decoration::Shadow { .. } => {}
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_verse_block(svg: &mut String, card: &Card, block: &VerseBlock) {
    let cx = card.width / 2.0;
    let bottom = card.height - card_core::card::CARD_PADDING;
    let top = bottom - block.height();

    // Quote badge above the text.
    let badge_y = top - 36.0;
    let _ = write!(
        svg,
        "<circle cx=\"{cx}\" cy=\"{badge_y}\" r=\"22\" fill=\"#ffffff\" fill-opacity=\"0.1\" stroke=\"#ffffff\" stroke-opacity=\"0.2\"/><text x=\"{cx}\" y=\"{}\" font-size=\"28\" font-family=\"serif\" text-anchor=\"middle\" fill=\"#ffffff\">\u{201c}</text>",
        badge_y + 12.0,
    );

    for (idx, line) in block.lines.iter().enumerate() {
        let baseline = top + block.font_size + idx as f32 * block.line_height;
        let _ = write!(
            svg,
            "<text x=\"{cx}\" y=\"{baseline}\" font-size=\"{}\" font-family=\"serif\" font-weight=\"500\" text-anchor=\"middle\" fill=\"#ffffff\">{}</text>",
            block.font_size,
            escape_xml(line),
        );
    }

    let divider_y = top + block.lines.len() as f32 * block.line_height + 12.0;
    let accent = Color::ACCENT.hex();
    let _ = write!(
        svg,
        "<line x1=\"{}\" y1=\"{divider_y}\" x2=\"{}\" y2=\"{divider_y}\" stroke=\"{accent}\" stroke-width=\"1\"/>",
        cx - 32.0,
        cx + 32.0,
    );

    let _ = write!(
        svg,
        "<text x=\"{cx}\" y=\"{bottom}\" font-size=\"{}\" font-family=\"sans-serif\" font-weight=\"700\" letter-spacing=\"0.5\" text-anchor=\"middle\" fill=\"{accent}\">{}</text>",
        block.reference_font_size,
        escape_xml(&block.reference),
    );
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"48\" height=\"2\" rx=\"1\" fill=\"{accent}\" fill-opacity=\"0.6\"/>",
        cx - 24.0,
        bottom + 8.0,
    );
}

#[allow(clippy::cast_precision_loss)]
fn render_placeholder(svg: &mut String, card: &Card, block: &PlaceholderBlock) {
    let cx = card.width / 2.0;
    let bottom = card.height - card_core::card::CARD_PADDING;

    // Progress chips along the bottom.
    let chip_w = 72.0;
    let chip_h = 26.0;
    let chip_gap = 28.0;
    let chips_w = block.steps.len() as f32 * chip_w + (block.steps.len().max(1) - 1) as f32 * chip_gap;
    let chip_y = bottom - chip_h;
    for (idx, step) in block.steps.iter().enumerate() {
        let chip_x = cx - chips_w / 2.0 + idx as f32 * (chip_w + chip_gap);
        let _ = write!(
            svg,
            "<rect x=\"{chip_x}\" y=\"{chip_y}\" width=\"{chip_w}\" height=\"{chip_h}\" rx=\"13\" fill=\"#ffffff\" fill-opacity=\"0.1\" stroke=\"#ffffff\" stroke-opacity=\"0.2\"/><circle cx=\"{}\" cy=\"{}\" r=\"4\" fill=\"#ffffff\" fill-opacity=\"0.4\"/><text x=\"{}\" y=\"{}\" font-size=\"12\" font-family=\"sans-serif\" font-weight=\"500\" fill=\"#ffffff\" fill-opacity=\"0.6\">{}</text>",
            chip_x + 14.0,
            chip_y + chip_h / 2.0,
            chip_x + 24.0,
            chip_y + 17.0,
            escape_xml(step),
        );
        if idx + 1 < block.steps.len() {
            let line_x = chip_x + chip_w + 6.0;
            let _ = write!(
                svg,
                "<line x1=\"{line_x}\" y1=\"{0}\" x2=\"{1}\" y2=\"{0}\" stroke=\"#ffffff\" stroke-opacity=\"0.2\"/>",
                chip_y + chip_h / 2.0,
                line_x + chip_gap - 12.0,
            );
        }
    }

    let mut y = chip_y - 32.0 - (block.prompt_lines.len() as f32 - 1.0).max(0.0) * 24.0;
    let prompt_top = y;
    for line in &block.prompt_lines {
        let _ = write!(
            svg,
            "<text x=\"{cx}\" y=\"{y}\" font-size=\"16\" font-family=\"serif\" text-anchor=\"middle\" fill=\"#ffffff\" fill-opacity=\"0.7\">{}</text>",
            escape_xml(line),
        );
        y += 24.0;
    }

    let heading_y = prompt_top - 36.0;
    let _ = write!(
        svg,
        "<text x=\"{cx}\" y=\"{heading_y}\" font-size=\"20\" font-family=\"serif\" font-weight=\"600\" text-anchor=\"middle\" fill=\"#ffffff\" fill-opacity=\"0.8\">{}</text>",
        escape_xml(&block.heading),
    );

    let icon_y = heading_y - 56.0;
    let _ = write!(
        svg,
        "<circle cx=\"{cx}\" cy=\"{icon_y}\" r=\"28\" fill=\"#ffffff\" fill-opacity=\"0.05\" stroke=\"#ffffff\" stroke-opacity=\"0.1\"/><path d=\"M{cx},{t} Q{cx},{icon_y} {r},{icon_y} Q{cx},{icon_y} {cx},{b} Q{cx},{icon_y} {l},{icon_y} Q{cx},{icon_y} {cx},{t} Z\" fill=\"#ffffff\" fill-opacity=\"0.5\"/>",
        t = icon_y - 14.0,
        b = icon_y + 14.0,
        l = cx - 14.0,
        r = cx + 14.0,
    );
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
