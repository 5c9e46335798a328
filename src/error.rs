//! Error types for netradio
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for netradio
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine refused to begin opening a stream
    #[error("Stream open error: {0}")]
    StreamOpen(String),

    /// Other engine call failures
    #[error("Engine error: {0}")]
    Engine(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using netradio Error
pub type Result<T> = std::result::Result<T, Error>;
