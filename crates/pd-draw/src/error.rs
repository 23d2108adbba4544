//! Draw transition errors

use thiserror::Error;

use crate::SystemState;

/// Why a draw transition was refused. The machine and the roster are left
/// exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("Cannot {action} while {state:?}")]
    InvalidTransition {
        state: SystemState,
        action: &'static str,
    },

    #[error("Unknown prize: {0}")]
    UnknownPrize(String),

    #[error("Prize already completed: {0}")]
    PrizeCompleted(String),

    #[error("Another prize is being drawn: {0}")]
    DrawInProgress(String),

    #[error("No eligible participants for prize: {0}")]
    NoEligibleParticipants(String),

    #[error("Participant is not pending: {0}")]
    NotPending(String),

    #[error("No active draw")]
    NoActiveDraw,
}

/// Result type alias
pub type DrawResult<T> = Result<T, DrawError>;
