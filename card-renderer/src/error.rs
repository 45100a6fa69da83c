//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The card to export does not carry the expected identifier.
    #[error("Card element not found: expected id {expected}, got {found}")]
    CardNotFound {
        /// Identifier export looks for.
        expected: &'static str,
        /// Identifier the card actually has.
        found: String,
    },

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),
}
