//! Error types for Survey Core
//!
//! Verification and storage failures are kept apart so the gateway can map
//! each one to its own status code. Display strings are what callers see in
//! the `message` field of an error envelope.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Umbrella error for core operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures talking to the bot-verification service
///
/// A response with `success: false` is not an error; it decodes fine and the
/// caller decides what to do with it.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Post to recaptcha error {0}")]
    Transport(String),

    #[error("Read error: could not read body {0}")]
    Read(String),

    #[error("Read error: got invalid JSON {0}")]
    Decode(String),
}

/// Failures writing an object
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    #[error("upload rejected with status {status}: {body}")]
    Upload { status: u16, body: String },

    #[error("upload request failed: {0}")]
    Transport(String),

    #[error("could not obtain access token: {0}")]
    Auth(String),

    #[error("invalid object key: {0:?}")]
    InvalidKey(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_messages() {
        let e = VerificationError::Decode("expected value at line 1 column 1".to_string());
        assert_eq!(
            e.to_string(),
            "Read error: got invalid JSON expected value at line 1 column 1"
        );

        let e = VerificationError::Transport("connection refused".to_string());
        assert!(e.to_string().starts_with("Post to recaptcha error"));
    }

    #[test]
    fn test_core_error_is_transparent() {
        let e: CoreError = StorageError::Timeout(Duration::from_secs(50)).into();
        assert_eq!(e.to_string(), "write timed out after 50s");
    }
}
