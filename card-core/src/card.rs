//! Card composition: the layered visual built from an image and a verse.
//!
//! ```text
//! ┌──────────────────────────── verse-card ─┐
//! │ decorations (sparkle, quote, heart, …)  │
//! │ content: verse block | placeholder      │
//! │ overlays (only over a photo)            │
//! │ background: photo | divine gradient     │
//! └─────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::layout::{chars_per_line, wrap_text};
use crate::{ImageRef, Verse};

/// Stable identifier of the rendered card, used by export to locate it.
pub const CARD_ELEMENT_ID: &str = "verse-card";

/// Card width in CSS pixels.
pub const CARD_WIDTH: f32 = 448.0;

/// Card height in CSS pixels (4:5 aspect ratio).
pub const CARD_HEIGHT: f32 = 560.0;

/// Inner padding around the content block.
pub const CARD_PADDING: f32 = 32.0;

/// Corner radius of the card.
pub const CORNER_RADIUS: f32 = 24.0;

/// Verse text size.
pub const VERSE_FONT_SIZE: f32 = 20.0;

/// Reference text size.
pub const REFERENCE_FONT_SIZE: f32 = 16.0;

/// Heading shown when no verse is selected.
pub const PLACEHOLDER_HEADING: &str = "Your Masterpiece Awaits";

/// Prompt shown when no verse is selected.
pub const PLACEHOLDER_PROMPT: &str =
    "Upload an image and choose a verse to create your inspiring card";

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Opacity in `0.0..=1.0`.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Golden accent used for references and highlights.
    pub const ACCENT: Self = Self::rgb(245, 184, 65);

    /// Opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same color with a different opacity.
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Hex notation without alpha, e.g. `#f5b841`.
    #[must_use]
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One stop of a linear gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in `0.0..=1.0`.
    pub offset: f32,
    /// Color at this stop.
    pub color: Color,
}

/// Direction a linear gradient runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    /// Bottom edge to top edge.
    ToTop,
    /// Top-left corner to bottom-right corner.
    ToBottomRight,
}

/// A full-card linear gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Direction of travel.
    pub direction: GradientDirection,
    /// Color stops, ordered by offset.
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    fn new(direction: GradientDirection, stops: &[(f32, Color)]) -> Self {
        Self {
            direction,
            stops: stops
                .iter()
                .map(|&(offset, color)| GradientStop { offset, color })
                .collect(),
        }
    }

    /// The blue-to-violet gradient shown when no photo is selected.
    #[must_use]
    pub fn divine() -> Self {
        Self::new(
            GradientDirection::ToBottomRight,
            &[
                (0.0, Color::rgb(37, 99, 235).with_alpha(0.9)),
                (1.0, Color::rgb(147, 51, 234).with_alpha(0.9)),
            ],
        )
    }
}

/// Bottom layer of the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    /// A photo covering the card.
    Image {
        /// Image source: a `data:` URI or a proxied path.
        href: String,
    },
    /// No photo selected.
    Placeholder {
        /// Fill gradient.
        gradient: Gradient,
    },
}

/// Purely ornamental marks. Export may strip all of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decoration {
    /// Four-pointed sparkle.
    Sparkle {
        /// Center X.
        x: f32,
        /// Center Y.
        y: f32,
        /// Outer radius.
        size: f32,
        /// Opacity.
        opacity: f32,
    },
    /// Opening quotation mark glyph.
    QuoteMark {
        /// Left edge.
        x: f32,
        /// Baseline.
        y: f32,
        /// Glyph size.
        size: f32,
        /// Opacity.
        opacity: f32,
    },
    /// Small heart in the accent color.
    Heart {
        /// Center X.
        x: f32,
        /// Center Y.
        y: f32,
        /// Width of the heart.
        size: f32,
        /// Opacity.
        opacity: f32,
    },
    /// Quarter-circle glow in the bottom-right corner.
    CornerAccent {
        /// Radius of the quarter circle.
        size: f32,
    },
    /// Thin rounded border around the card.
    BorderGlow {
        /// Stroke color.
        color: Color,
    },
    /// Drop shadow behind the card.
    Shadow {
        /// Blur deviation.
        blur: f32,
    },
}

/// Verse text block, pre-wrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseBlock {
    /// Wrapped lines of the quoted text, quotes included.
    pub lines: Vec<String>,
    /// Reference line.
    pub reference: String,
    /// Font size of the verse lines.
    pub font_size: f32,
    /// Distance between baselines.
    pub line_height: f32,
    /// Font size of the reference.
    pub reference_font_size: f32,
}

impl VerseBlock {
    /// Height of the block from the first line's top to the reference baseline.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn height(&self) -> f32 {
        // Lines, gap with divider, reference.
        self.lines.len() as f32 * self.line_height + 40.0 + self.reference_font_size
    }
}

/// Empty-state prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderBlock {
    /// Heading line.
    pub heading: String,
    /// Wrapped prompt lines.
    pub prompt_lines: Vec<String>,
    /// Progress chips, e.g. `Image` and `Verse`.
    pub steps: Vec<String>,
}

/// Foreground content of the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// A verse is selected.
    Verse(VerseBlock),
    /// Nothing selected yet.
    Placeholder(PlaceholderBlock),
}

/// A fully composed card, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Stable identifier; always [`CARD_ELEMENT_ID`] for composed cards.
    pub id: String,
    /// Width in CSS pixels.
    pub width: f32,
    /// Height in CSS pixels.
    pub height: f32,
    /// Corner radius.
    pub corner_radius: f32,
    /// Bottom layer.
    pub background: Background,
    /// Gradient overlays, bottom to top.
    pub overlays: Vec<Gradient>,
    /// Ornamental layers.
    pub decorations: Vec<Decoration>,
    /// Foreground text.
    pub content: Content,
}

impl Card {
    /// Copy of this card with decorative borders, shadows and ornaments removed.
    ///
    /// The original card is untouched, so there is nothing to restore
    /// afterwards.
    #[must_use]
    pub fn without_decorations(&self) -> Self {
        Self {
            decorations: Vec::new(),
            ..self.clone()
        }
    }

    /// Copy of this card with the background photo source replaced.
    ///
    /// Used to swap a proxied remote path for the fetched bytes before export.
    /// Placeholder backgrounds are left as they are.
    #[must_use]
    pub fn with_background_href(&self, href: impl Into<String>) -> Self {
        let mut card = self.clone();
        if let Background::Image { href: current } = &mut card.background {
            *current = href.into();
        }
        card
    }

    /// Whether a verse is shown.
    #[must_use]
    pub fn has_verse(&self) -> bool {
        matches!(self.content, Content::Verse(_))
    }
}

/// Compose a card from the current selection.
///
/// Pure: the same inputs always yield the same card.
#[must_use]
pub fn compose(image: Option<&ImageRef>, verse: Option<&Verse>) -> Card {
    let (background, overlays) = match image {
        Some(image) => (
            Background::Image { href: image.href() },
            vec![
                Gradient::new(
                    GradientDirection::ToTop,
                    &[
                        (0.0, Color::BLACK.with_alpha(0.8)),
                        (0.5, Color::BLACK.with_alpha(0.4)),
                        (1.0, Color::BLACK.with_alpha(0.1)),
                    ],
                ),
                Gradient::new(
                    GradientDirection::ToBottomRight,
                    &[
                        (0.0, Color::ACCENT.with_alpha(0.0)),
                        (0.5, Color::ACCENT.with_alpha(0.0)),
                        (1.0, Color::ACCENT.with_alpha(0.1)),
                    ],
                ),
            ],
        ),
        None => (
            Background::Placeholder {
                gradient: Gradient::divine(),
            },
            Vec::new(),
        ),
    };

    let content_width = CARD_WIDTH - 2.0 * CARD_PADDING;
    let content = match verse {
        Some(verse) => {
            let quoted = format!("\u{201c}{}\u{201d}", verse.text);
            Content::Verse(VerseBlock {
                lines: wrap_text(&quoted, chars_per_line(content_width, VERSE_FONT_SIZE)),
                reference: verse.reference.clone(),
                font_size: VERSE_FONT_SIZE,
                line_height: VERSE_FONT_SIZE * 1.625,
                reference_font_size: REFERENCE_FONT_SIZE,
            })
        }
        None => Content::Placeholder(PlaceholderBlock {
            heading: PLACEHOLDER_HEADING.to_string(),
            prompt_lines: wrap_text(PLACEHOLDER_PROMPT, chars_per_line(content_width - 64.0, 16.0)),
            steps: vec!["Image".to_string(), "Verse".to_string()],
        }),
    };

    Card {
        id: CARD_ELEMENT_ID.to_string(),
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
        corner_radius: CORNER_RADIUS,
        background,
        overlays,
        decorations: default_decorations(),
        content,
    }
}

fn default_decorations() -> Vec<Decoration> {
    vec![
        Decoration::Shadow { blur: 12.0 },
        Decoration::Sparkle {
            x: CARD_WIDTH - 36.0,
            y: 36.0,
            size: 12.0,
            opacity: 0.3,
        },
        Decoration::QuoteMark {
            x: 24.0,
            y: 60.0,
            size: 48.0,
            opacity: 0.2,
        },
        Decoration::Heart {
            x: CARD_WIDTH - 34.0,
            y: CARD_HEIGHT - 138.0,
            size: 20.0,
            opacity: 0.2,
        },
        Decoration::CornerAccent { size: 64.0 },
        Decoration::BorderGlow {
            color: Color::WHITE.with_alpha(0.1),
        },
    ]
}
