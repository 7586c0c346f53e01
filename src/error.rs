//! Error types for pinlink-agent
//!
//! This module defines the error types used throughout the application.
//! We use `thiserror` for ergonomic error definitions and `anyhow` for
//! error propagation in application code.

use thiserror::Error;

/// Main error type for pinlink-agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// GPIO hardware errors (chip open, line request, level write)
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Message endpoint errors (bind, serve, teardown)
    #[error("Endpoint error: {0}")]
    Endpoint(String),

    /// A received frame exceeded the configured bound
    #[error("Frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Declared length of the offending frame
        len: usize,
        /// Configured maximum frame length
        max: usize,
    },

    /// Invalid state errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<toml::de::Error> for AgentError {
    fn from(err: toml::de::Error) -> Self {
        AgentError::Config(err.to_string())
    }
}
