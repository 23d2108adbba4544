//! Backup workbook codec
//!
//! The backup mirrors the event spreadsheet: one sheet per entity list.
//!
//! ```text
//! Prizes          id, name, quantity, drawn_count, remaining, order, exclude_winners, status
//! Winners         id, prize_name, prize_id, participant_name, participant_id,
//!                 department, title, drawn_at (RFC 3339), confirmed
//! Pool            participants that have not won yet
//! AllParticipants id, name, department, title, has_won
//! ```
//!
//! Sheets are serialized as JSON. Restoring resolves every winner row
//! against the restored participants and prizes; rows that do not resolve
//! are reported, never guessed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pd_core::{
    Participant, ParticipantId, PdError, PdResult, Prize, PrizeId, PrizeStatus, Roster, Winner,
    WinnerId,
};

use crate::{ImportReport, resolve_winners};

/// Current backup format version
pub const BACKUP_FORMAT_VERSION: u32 = 1;

// ============ Sheet Rows ============

/// Prizes sheet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeRow {
    pub id: PrizeId,
    pub name: String,
    pub quantity: u32,
    pub drawn_count: u32,
    /// Informational; recomputed on restore
    pub remaining: u32,
    pub order: usize,
    pub exclude_winners: bool,
    pub status: PrizeStatus,
}

impl From<&Prize> for PrizeRow {
    fn from(prize: &Prize) -> Self {
        Self {
            id: prize.id.clone(),
            name: prize.name.clone(),
            quantity: prize.quantity,
            drawn_count: prize.drawn_count,
            remaining: prize.remaining(),
            order: prize.order,
            exclude_winners: prize.exclude_winners,
            status: prize.status,
        }
    }
}

impl From<PrizeRow> for Prize {
    fn from(row: PrizeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            quantity: row.quantity.max(1),
            drawn_count: row.drawn_count,
            order: row.order,
            exclude_winners: row.exclude_winners,
            status: row.status,
        }
    }
}

/// Winners sheet row. Ids are optional so hand-edited or exported sheets
/// can be matched by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRow {
    #[serde(default)]
    pub id: Option<WinnerId>,
    #[serde(default)]
    pub prize_id: Option<PrizeId>,
    pub prize_name: String,
    #[serde(default)]
    pub participant_id: Option<ParticipantId>,
    pub participant_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub drawn_at: Option<DateTime<Utc>>,
    #[serde(default = "default_confirmed")]
    pub confirmed: bool,
}

fn default_confirmed() -> bool {
    true
}

impl From<&Winner> for WinnerRow {
    fn from(winner: &Winner) -> Self {
        Self {
            id: Some(winner.id.clone()),
            prize_id: Some(winner.prize.id.clone()),
            prize_name: winner.prize.name.clone(),
            participant_id: Some(winner.participant.id.clone()),
            participant_name: winner.participant.name.clone(),
            department: winner.participant.department.clone(),
            title: winner.participant.title.clone(),
            drawn_at: Some(winner.drawn_at),
            confirmed: winner.confirmed,
        }
    }
}

/// Pool sheet row (participants still eligible everywhere)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRow {
    pub id: ParticipantId,
    pub name: String,
    pub department: String,
    pub title: String,
}

/// AllParticipants sheet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub id: ParticipantId,
    pub name: String,
    pub department: String,
    pub title: String,
    pub has_won: bool,
}

impl From<&Participant> for ParticipantRow {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            department: p.department.clone(),
            title: p.title.clone(),
            has_won: p.has_won,
        }
    }
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            department: row.department,
            title: row.title,
            has_won: row.has_won,
        }
    }
}

// ============ Workbook ============

/// Combined backup of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BackupWorkbook {
    pub version: u32,
    pub prizes: Vec<PrizeRow>,
    pub winners: Vec<WinnerRow>,
    #[serde(default)]
    pub pool: Vec<PoolRow>,
    pub all_participants: Vec<ParticipantRow>,
}

/// Result of decoding a backup
#[derive(Debug, Clone)]
pub struct RestoredSession {
    pub roster: Roster,
    /// Winner rows that did not resolve, one message each
    pub warnings: Vec<String>,
}

impl RestoredSession {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl BackupWorkbook {
    pub fn from_parts(participants: &[Participant], prizes: &[Prize], winners: &[Winner]) -> Self {
        Self {
            version: BACKUP_FORMAT_VERSION,
            prizes: prizes.iter().map(PrizeRow::from).collect(),
            winners: winners.iter().map(WinnerRow::from).collect(),
            pool: participants
                .iter()
                .filter(|p| !p.has_won)
                .map(|p| PoolRow {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    department: p.department.clone(),
                    title: p.title.clone(),
                })
                .collect(),
            all_participants: participants.iter().map(ParticipantRow::from).collect(),
        }
    }

    pub fn from_roster(roster: &Roster) -> Self {
        Self::from_parts(roster.participants(), roster.prizes(), roster.winners())
    }

    pub fn to_bytes(&self) -> PdResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> PdResult<Self> {
        let workbook: Self = serde_json::from_slice(bytes)?;
        if workbook.version > BACKUP_FORMAT_VERSION {
            return Err(PdError::UnsupportedVersion(workbook.version));
        }
        Ok(workbook)
    }

    /// Rebuild the roster. `drawn_count` and `has_won` are re-derived from
    /// the winner rows that resolved.
    pub fn restore(self) -> RestoredSession {
        restore_sheets(self.all_participants, self.prizes, &self.winners)
    }
}

/// Rebuild a roster from individual sheets
pub fn restore_sheets(
    participants: Vec<ParticipantRow>,
    prizes: Vec<PrizeRow>,
    winners: &[WinnerRow],
) -> RestoredSession {
    let participants: Vec<Participant> = participants.into_iter().map(Participant::from).collect();
    let prizes: Vec<Prize> = prizes.into_iter().map(Prize::from).collect();

    let ImportReport {
        entities, warnings, ..
    } = resolve_winners(winners, &participants, &prizes);

    RestoredSession {
        roster: Roster::from_parts(participants, prizes, entities),
        warnings,
    }
}

/// Encode one sheet on its own (separate backup slots)
pub fn encode_sheet<T: Serialize>(rows: &[T]) -> PdResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(rows)?)
}

pub fn decode_sheet<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> PdResult<Vec<T>> {
    Ok(serde_json::from_slice(bytes)?)
}
