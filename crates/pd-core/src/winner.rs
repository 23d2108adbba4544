//! Winner records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Participant, Prize, WinnerId};

/// A committed winner
///
/// Holds value copies of the participant and prize as they were at
/// confirmation time. Later edits to the live entities do not touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub id: WinnerId,
    pub participant: Participant,
    pub prize: Prize,
    pub drawn_at: DateTime<Utc>,
    pub confirmed: bool,
}

impl Winner {
    /// Create a confirmed winner record with a fresh id
    pub fn confirmed(participant: Participant, prize: Prize, drawn_at: DateTime<Utc>) -> Self {
        Self {
            id: WinnerId::generate(),
            participant,
            prize,
            drawn_at,
            confirmed: true,
        }
    }
}

/// One row of the exported winner list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerExportRow {
    pub prize_name: String,
    pub participant_name: String,
    pub department: String,
    pub title: String,
    pub drawn_at: DateTime<Utc>,
}

impl From<&Winner> for WinnerExportRow {
    fn from(winner: &Winner) -> Self {
        Self {
            prize_name: winner.prize.name.clone(),
            participant_name: winner.participant.name.clone(),
            department: winner.participant.department.clone(),
            title: winner.participant.title.clone(),
            drawn_at: winner.drawn_at,
        }
    }
}
