//! Error types for the animatronic eyes library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File or socket I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Video source could not be opened
    #[error("Video source error: {0}")]
    VideoSource(String),

    /// Detection recorder could not be opened or written
    #[error("Recording error: {0}")]
    Recording(String),

    /// Animation-state message did not match the wire layout
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Multicast transport setup failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Signal handler installation failed
    #[error("Signal handler error: {0}")]
    SignalHandler(#[from] ctrlc::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
