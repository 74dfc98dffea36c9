//! Error types for ostor-core
//!
//! Provides a unified error type shared by the orchestrator and all
//! provider backends.

use thiserror::Error;

/// Result type alias for ostor-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ostor-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Caller misuse: unregistered provider, ambiguous key scoping,
    /// unsupported local-to-local copy
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Location string matched a URL dialect but is malformed
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Resource not found (local file or remote object/bucket)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend/transport error
    #[error("Network error: {0}")]
    Network(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error indicates caller misuse rather than a failed
    /// remote operation
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::InvalidLocation(_))
    }
}
