//! Backup and persistence errors

use pd_core::PdError;

/// Backup errors
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Backup payload rejected: {0}")]
    Codec(#[from] PdError),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("{0} winner row(s) could not be resolved")]
    UnresolvedWinners(usize),
}

/// Result type alias
pub type BackupResult<T> = Result<T, BackupError>;
