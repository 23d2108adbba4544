//! Error types for the prize draw engine

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum PdError {
    #[error("Unknown winner: {0}")]
    UnknownWinner(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported payload version: {0}")]
    UnsupportedVersion(u32),
}

impl From<serde_json::Error> for PdError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias
pub type PdResult<T> = Result<T, PdError>;
