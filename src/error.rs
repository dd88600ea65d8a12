//! Error types for the share_transfer crate.

use thiserror::Error;

/// Errors raised by the remote API and the share URL parser.
///
/// These never cross the public surface of [`crate::ShareManager`]; the
/// manager folds them into boolean, empty or status results.
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),

    #[error("Invalid share URL: {0}")]
    InvalidShareUrl(String),
}

/// Result type alias for ShareError.
pub type Result<T> = std::result::Result<T, ShareError>;
