//! Input validation for untrusted data.
//!
//! All user-supplied identifiers MUST be validated before use.

use thiserror::Error;

/// Maximum length for session IDs.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Session ID exceeds maximum length.
    #[error("session_id too long (max {MAX_SESSION_ID_LEN} chars)")]
    SessionIdTooLong,
    /// Session ID contains invalid characters.
    #[error("session_id contains invalid characters")]
    SessionIdInvalidChars,
}

/// Check if a character is valid for IDs (alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a session ID.
///
/// Valid session IDs:
/// - 1-64 characters
/// - Alphanumeric, hyphen, underscore only
///
/// # Errors
///
/// Returns [`ValidationError::SessionIdTooLong`] if the ID exceeds 64 characters.
/// Returns [`ValidationError::SessionIdInvalidChars`] if the ID is empty or contains invalid characters.
pub fn validate_session_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_SESSION_ID_LEN {
        return Err(ValidationError::SessionIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::SessionIdInvalidChars);
    }
    Ok(())
}
