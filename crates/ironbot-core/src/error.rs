//! Error types for ironbot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Manifest errors
    #[error("Malformed manifest: {0}")]
    ManifestMalformed(String),

    // Queue errors
    #[error("Step injection rejected: {0}")]
    InjectionRejected(String),

    // Step errors
    #[error("Step failed with exit code {exit_code}: {message}")]
    StepFailed { exit_code: i32, message: String },

    #[error("Step timeout after {seconds} seconds")]
    StepTimeout { seconds: u64 },

    #[error("Checkout failed: {0}")]
    Checkout(String),

    // Notification errors
    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown builder: {0}")]
    UnknownBuilder(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
