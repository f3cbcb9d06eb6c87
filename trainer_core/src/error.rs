//! Error types for the trainer_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for trainer_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No stored workout matches the requested identifier
    #[error("Workout with ID {0} not found")]
    NotFound(String),

    /// Submitting a routine to the remote service failed
    #[error("Failed to push routine '{title}' to remote service: {source}")]
    RemoteService {
        title: String,
        source: Box<Error>,
    },

    /// The remote service answered without the fields we rely on
    #[error("Invalid remote response: {0}")]
    InvalidRemoteResponse(String),

    /// Non-success HTTP status from the remote service
    #[error("Remote API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
