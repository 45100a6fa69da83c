//! Download naming and share planning.

use serde::{Deserialize, Serialize};

use crate::{CardError, CardResult, Verse};

/// Title offered to native share sheets.
pub const SHARE_TITLE: &str = "Beautiful Bible Verse Card";

/// Character substituted for anything non-alphanumeric in file names.
pub const FILENAME_SEPARATOR: char = '-';

/// File name for a downloaded card, e.g. `verse-card-John-3-16.png`.
///
/// Every character of the reference outside `[A-Za-z0-9]` becomes
/// [`FILENAME_SEPARATOR`].
#[must_use]
pub fn download_filename(reference: &str, extension: &str) -> String {
    let slug: String = reference
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else {
                FILENAME_SEPARATOR
            }
        })
        .collect();
    format!("verse-card-{slug}.{extension}")
}

/// Text shared or copied for a verse: `"text" - reference`.
#[must_use]
pub fn share_text(verse: &Verse) -> String {
    format!("\"{}\" - {}", verse.text, verse.reference)
}

/// Payload for a native share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    /// Sheet title.
    pub title: String,
    /// Formatted verse text.
    pub text: String,
    /// Link back to the page.
    pub url: String,
}

/// What the client should do to share a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ShareAction {
    /// Invoke the platform share sheet with this payload.
    Native(SharePayload),
    /// Native sharing is unavailable; copy this text to the clipboard.
    Clipboard {
        /// Formatted verse text.
        text: String,
    },
}

/// Decide how to share the selected verse.
///
/// # Errors
///
/// Returns [`CardError::NoVerseSelected`] when `verse` is `None`.
pub fn plan_share(
    verse: Option<&Verse>,
    page_url: &str,
    native_supported: bool,
) -> CardResult<ShareAction> {
    let verse = verse.ok_or(CardError::NoVerseSelected)?;
    let text = share_text(verse);

    Ok(if native_supported {
        ShareAction::Native(SharePayload {
            title: SHARE_TITLE.to_string(),
            text,
            url: page_url.to_string(),
        })
    } else {
        ShareAction::Clipboard { text }
    })
}
