//! Per-session editor state: the current image and verse selection.

use serde::{Deserialize, Serialize};

use crate::card::{compose, Card};
use crate::{ImageRef, Verse, VerseOrigin};

/// Selection state for one editing session.
///
/// Holds at most one image and one verse. New selections replace the old
/// ones wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardEditor {
    image: Option<ImageRef>,
    verse: Option<Verse>,
    verse_origin: Option<VerseOrigin>,
    exporting: bool,
}

impl CardEditor {
    /// Create an empty editor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected image.
    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// Currently selected verse.
    #[must_use]
    pub fn verse(&self) -> Option<&Verse> {
        self.verse.as_ref()
    }

    /// Replace the selected image.
    pub fn set_image(&mut self, image: ImageRef) {
        self.image = Some(image);
    }

    /// Clear the selected image. Returns whether one was set.
    pub fn remove_image(&mut self) -> bool {
        self.image.take().is_some()
    }

    /// Where the selected verse came from.
    #[must_use]
    pub fn verse_origin(&self) -> Option<VerseOrigin> {
        self.verse_origin
    }

    /// Replace the selected verse.
    pub fn set_verse(&mut self, verse: Verse, origin: VerseOrigin) {
        self.verse = Some(verse);
        self.verse_origin = Some(origin);
    }

    /// Whether an export is running for this session.
    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub(crate) fn set_exporting(&mut self, exporting: bool) {
        self.exporting = exporting;
    }

    /// Compose the card for the current selection.
    #[must_use]
    pub fn card(&self) -> Card {
        compose(self.image.as_ref(), self.verse.as_ref())
    }

    /// Serializable view of this editor.
    #[must_use]
    pub fn snapshot(&self, session_id: &str) -> EditorSnapshot {
        EditorSnapshot {
            session_id: session_id.to_string(),
            image: self.image.as_ref().map(ImageSummary::from),
            verse: self.verse.clone(),
            verse_origin: self.verse_origin,
            exporting: self.exporting,
            can_export: self.verse.is_some() && !self.exporting,
        }
    }
}

/// Lightweight description of the selected image.
///
/// Inline payloads can be megabytes, so snapshots carry only their size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSummary {
    /// Uploaded image.
    Inline {
        /// Declared MIME type.
        mime: String,
        /// Length of the data URI in bytes.
        data_uri_len: usize,
    },
    /// Remote image.
    Remote {
        /// Original URL.
        url: String,
        /// Same-origin proxied path.
        proxied: String,
    },
}

impl From<&ImageRef> for ImageSummary {
    fn from(image: &ImageRef) -> Self {
        match image {
            ImageRef::Inline { mime, data_uri } => Self::Inline {
                mime: mime.clone(),
                data_uri_len: data_uri.len(),
            },
            ImageRef::Remote { url } => Self::Remote {
                url: url.clone(),
                proxied: image.href(),
            },
        }
    }
}

/// Serializable editor state returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    /// Session identifier.
    pub session_id: String,
    /// Selected image, if any.
    pub image: Option<ImageSummary>,
    /// Selected verse, if any.
    pub verse: Option<Verse>,
    /// Where the selected verse came from.
    pub verse_origin: Option<VerseOrigin>,
    /// Whether an export is running.
    pub exporting: bool,
    /// Whether the export control should be enabled.
    pub can_export: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_replaces_wholesale() {
        let mut editor = CardEditor::new();
        editor.set_verse(Verse::new("a", "A"), VerseOrigin::Popular);
        editor.set_verse(Verse::new("b", "B"), VerseOrigin::Custom);
        assert_eq!(editor.verse(), Some(&Verse::new("b", "B")));
        assert_eq!(editor.verse_origin(), Some(VerseOrigin::Custom));

        editor.set_image(ImageRef::inline("image/png", &[1]));
        editor.set_image(ImageRef::inline("image/jpeg", &[2]));
        assert!(matches!(
            editor.image(),
            Some(ImageRef::Inline { mime, .. }) if mime == "image/jpeg"
        ));
    }

    #[test]
    fn test_remove_image() {
        let mut editor = CardEditor::new();
        assert!(!editor.remove_image());
        editor.set_image(ImageRef::inline("image/png", &[1]));
        assert!(editor.remove_image());
        assert!(editor.image().is_none());
    }

    #[test]
    fn test_snapshot_summarizes_image() {
        let mut editor = CardEditor::new();
        editor.set_image(ImageRef::inline("image/png", &[1, 2, 3]));
        let snapshot = editor.snapshot("s1");
        assert_eq!(snapshot.session_id, "s1");
        assert_eq!(
            snapshot.image,
            Some(ImageSummary::Inline {
                mime: "image/png".into(),
                data_uri_len: "data:image/png;base64,AQID".len(),
            })
        );
        assert!(!snapshot.can_export);
    }

    #[test]
    fn test_can_export_needs_verse() {
        let mut editor = CardEditor::new();
        editor.set_verse(Verse::new("T", "R"), VerseOrigin::Remote);
        assert!(editor.snapshot("s").can_export);
        editor.set_exporting(true);
        assert!(!editor.snapshot("s").can_export);
    }

    #[test]
    fn test_card_tracks_selection() {
        let mut editor = CardEditor::new();
        assert!(!editor.card().has_verse());
        editor.set_verse(Verse::new("T", "R"), VerseOrigin::Remote);
        assert!(editor.card().has_verse());
    }
}
