//! Error types for the turnbell binary.

use thiserror::Error;

/// Errors that can occur in the turnbell binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error (stdin, config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using `CliError`.
pub type Result<T> = std::result::Result<T, CliError>;
