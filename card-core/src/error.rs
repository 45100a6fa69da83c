//! Error types for card operations.

use thiserror::Error;

/// Result type for card operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors raised when user input is rejected.
///
/// None of these change editor state: the rejected action is simply dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// Custom verse text was empty after trimming.
    #[error("Please enter verse text")]
    EmptyVerseText,

    /// An operation required a verse but none is selected.
    #[error("Please select a verse first")]
    NoVerseSelected,

    /// The uploaded file is not an image.
    #[error("Please select an image file (JPG, PNG, etc.), got {0}")]
    UnsupportedMediaType(String),

    /// The uploaded file exceeds the size ceiling.
    #[error("Please select an image smaller than {limit} bytes (got {size})")]
    FileTooLarge {
        /// Size of the rejected upload in bytes.
        size: usize,
        /// Configured ceiling in bytes.
        limit: usize,
    },

    /// The upload body was empty.
    #[error("No file provided")]
    EmptyUpload,

    /// A remote image URL could not be parsed.
    #[error("Invalid image URL: {0}")]
    InvalidImageUrl(String),

    /// A curated verse index was out of range.
    #[error("No popular verse at index {index} (have {len})")]
    PopularIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of curated verses.
        len: usize,
    },

    /// An export for the same session is already running.
    #[error("An export is already in progress")]
    ExportInProgress,
}
