//! Error types for fasterspeech-rs.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Candle tensor/model error.
    #[error("candle: {0}")]
    Candle(#[from] candle_core::Error),

    /// Operation that is deliberately not implemented.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Tensor shape contract violation.
    #[error("shape: {0}")]
    Shape(String),

    /// Invalid configuration.
    #[error("config: {0}")]
    Config(String),

    /// Audio processing error (WAV decoding, sample-rate mismatch).
    #[error("audio: {0}")]
    Audio(String),

    /// Manifest or duration-cache error.
    #[error("manifest: {0}")]
    Manifest(String),

    /// I/O error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<hound::Error> for Error {
    fn from(error: hound::Error) -> Self {
        Error::Audio(error.to_string())
    }
}
