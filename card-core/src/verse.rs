//! Verses and the curated fallback list.

use serde::{Deserialize, Serialize};

use crate::{CardError, CardResult};

/// Reference used when a custom verse is submitted without one.
pub const DEFAULT_CUSTOM_REFERENCE: &str = "Custom Verse";

/// A quoted text with its reference, e.g. `John 3:16`.
///
/// Verses are immutable once selected and replaced wholesale on re-selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verse {
    /// The quoted text.
    pub text: String,
    /// Book/chapter/verse reference or a free-form attribution.
    pub reference: String,
}

impl Verse {
    /// Create a verse from already-normalized parts.
    #[must_use]
    pub fn new(text: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference: reference.into(),
        }
    }

    /// Build a user-authored verse.
    ///
    /// Both fields are trimmed. An empty reference falls back to
    /// [`DEFAULT_CUSTOM_REFERENCE`].
    ///
    /// # Errors
    ///
    /// Returns [`CardError::EmptyVerseText`] if `text` is blank.
    pub fn custom(text: &str, reference: Option<&str>) -> CardResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CardError::EmptyVerseText);
        }

        let reference = reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_CUSTOM_REFERENCE);

        Ok(Self::new(text, reference))
    }
}

/// Where a verse came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerseOrigin {
    /// Looked up from the remote verse dataset.
    Remote,
    /// Substituted from the curated list after a failed remote lookup.
    Fallback,
    /// Picked directly from the curated list.
    Popular,
    /// Typed by the user.
    Custom,
}

/// Curated verses: offered directly and used as the random-lookup fallback.
const POPULAR: &[(&str, &str)] = &[
    (
        "For God so loved the world, that he gave his only begotten Son, that whosoever believeth on him should not perish, but have eternal life.",
        "John 3:16",
    ),
    (
        "For I know the thoughts that I think toward you, saith Jehovah, thoughts of peace, and not of evil, to give you hope in your latter end.",
        "Jeremiah 29:11",
    ),
    (
        "Trust in Jehovah with all thy heart, And lean not upon thine own understanding.",
        "Proverbs 3:5",
    ),
    (
        "I can do all things in him that strengtheneth me.",
        "Philippians 4:13",
    ),
    (
        "Jehovah is my shepherd; I shall not want.",
        "Psalms 23:1",
    ),
    (
        "And we know that to them that love God all things work together for good, even to them that are called according to his purpose.",
        "Romans 8:28",
    ),
    (
        "Be strong and of good courage; be not affrighted, neither be thou dismayed: for Jehovah thy God is with thee whithersoever thou goest.",
        "Joshua 1:9",
    ),
    (
        "But they that wait for Jehovah shall renew their strength; they shall mount up with wings as eagles; they shall run, and not be weary; they shall walk, and not faint.",
        "Isaiah 40:31",
    ),
    (
        "In nothing be anxious; but in everything by prayer and supplication with thanksgiving let your requests be made known unto God.",
        "Philippians 4:6",
    ),
    (
        "Come unto me, all ye that labor and are heavy laden, and I will give you rest.",
        "Matthew 11:28",
    ),
    (
        "Thy word is a lamp unto my feet, And light unto my path.",
        "Psalms 119:105",
    ),
    (
        "Casting all your anxiety upon him, because he careth for you.",
        "1 Peter 5:7",
    ),
];

/// The curated verse list, in display order.
#[must_use]
pub fn popular_verses() -> Vec<Verse> {
    POPULAR
        .iter()
        .map(|(text, reference)| Verse::new(*text, *reference))
        .collect()
}

/// Number of curated verses.
#[must_use]
pub fn popular_count() -> usize {
    POPULAR.len()
}

/// Look up a curated verse by index.
///
/// # Errors
///
/// Returns [`CardError::PopularIndexOutOfRange`] if `index` is past the end.
pub fn popular_verse(index: usize) -> CardResult<Verse> {
    POPULAR
        .get(index)
        .map(|(text, reference)| Verse::new(*text, *reference))
        .ok_or(CardError::PopularIndexOutOfRange {
            index,
            len: POPULAR.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_verse_trims_fields() {
        let verse = Verse::custom("  Be still  ", Some("  Psalms 46:10 ")).expect("valid");
        assert_eq!(verse.text, "Be still");
        assert_eq!(verse.reference, "Psalms 46:10");
    }

    #[test]
    fn test_custom_verse_default_reference() {
        let verse = Verse::custom("Hello", None).expect("valid");
        assert_eq!(verse.reference, DEFAULT_CUSTOM_REFERENCE);

        let verse = Verse::custom("Hello", Some("   ")).expect("valid");
        assert_eq!(verse.reference, DEFAULT_CUSTOM_REFERENCE);
    }

    #[test]
    fn test_custom_verse_rejects_blank_text() {
        assert_eq!(Verse::custom("", None), Err(CardError::EmptyVerseText));
        assert_eq!(
            Verse::custom(" \n\t ", Some("John 1:1")),
            Err(CardError::EmptyVerseText)
        );
    }

    #[test]
    fn test_popular_list_is_non_empty_and_indexed() {
        let verses = popular_verses();
        assert_eq!(verses.len(), popular_count());
        assert!(!verses.is_empty());
        assert_eq!(popular_verse(0).expect("first"), verses[0]);
        assert!(verses.iter().all(|v| !v.text.is_empty() && !v.reference.is_empty()));
    }

    #[test]
    fn test_popular_index_out_of_range() {
        let err = popular_verse(popular_count()).expect_err("out of range");
        assert!(matches!(err, CardError::PopularIndexOutOfRange { .. }));
    }

    #[test]
    fn test_origin_serialization() {
        let json = serde_json::to_string(&VerseOrigin::Fallback).expect("serialize");
        assert_eq!(json, "\"fallback\"");
    }
}
