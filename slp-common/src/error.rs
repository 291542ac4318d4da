//! Common error types for SignLink

use thiserror::Error;

/// Common result type for SignLink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SignLink crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error (wraps toml::de::Error)
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Gesture source (classifier or simulator) failed to produce a sample
    #[error("Gesture source error: {0}")]
    Source(String),
}
