//! Draw record, draw modes and system states

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use pd_core::{Participant, ParticipantId, PrizeId};

/// Phase of the console/display pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemState {
    /// Idle, waiting for the operator
    Standby,
    /// Sample computed, display animating
    Drawing,
    /// Picks shown, awaiting confirm or reject
    Confirming,
    /// Confirmed winners on screen
    Revealing,
}

impl Default for SystemState {
    fn default() -> Self {
        Self::Standby
    }
}

/// How many participants one cycle draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// Every remaining slot at once
    All,
    /// One per cycle, manual restart after each confirm
    One,
    /// One per cycle, chained until `custom_draw_count` confirmations
    Custom,
}

impl Default for DrawMode {
    fn default() -> Self {
        Self::One
    }
}

impl DrawMode {
    /// Participants to sample for a prize with `remaining` open slots
    pub fn batch_size(self, remaining: u32) -> usize {
        match self {
            Self::All => remaining as usize,
            Self::One | Self::Custom => remaining.min(1) as usize,
        }
    }
}

/// The in-flight draw session of one prize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub prize_id: PrizeId,
    /// Everyone confirmed during this prize session, in confirmation order
    pub drawn_participants: Vec<Participant>,
    pub confirmed_count: u32,
    /// Sampled, awaiting confirm or reject
    pub pending_participants: Vec<Participant>,
    /// Confirmed in the current round, shown by the display
    pub reveal_participants: Vec<Participant>,
    /// Sample computed by `begin_draw`, applied by `settle_draw`
    #[serde(default)]
    pub staged_participants: Vec<Participant>,
    /// Rejected since the last fresh sample
    #[serde(default)]
    pub rejected: Vec<ParticipantId>,
    /// Confirmed since the last fresh sample
    #[serde(default)]
    pub round_confirmed: Vec<Participant>,
    /// `confirmed_count` at the last manual start
    #[serde(default)]
    pub batch_start: u32,
}

impl Draw {
    pub fn new(prize_id: PrizeId) -> Self {
        Self {
            prize_id,
            drawn_participants: Vec::new(),
            confirmed_count: 0,
            pending_participants: Vec::new(),
            reveal_participants: Vec::new(),
            staged_participants: Vec::new(),
            rejected: Vec::new(),
            round_confirmed: Vec::new(),
            batch_start: 0,
        }
    }

    pub fn is_pending(&self, id: &ParticipantId) -> bool {
        self.pending_participants.iter().any(|p| &p.id == id)
    }

    /// Confirmations since the operator last started this prize
    pub fn batch_confirmed(&self) -> u32 {
        self.confirmed_count.saturating_sub(self.batch_start)
    }

    /// Ids a replacement pick must avoid: pending, rejected and confirmed
    /// in this round
    pub fn round_exclusions(&self) -> HashSet<ParticipantId> {
        self.pending_participants
            .iter()
            .chain(self.round_confirmed.iter())
            .map(|p| p.id.clone())
            .chain(self.rejected.iter().cloned())
            .collect()
    }

    /// Start a new round with a fresh sample
    pub(crate) fn open_round(&mut self, picks: Vec<Participant>) {
        self.staged_participants = picks;
        self.pending_participants.clear();
        self.reveal_participants.clear();
        self.rejected.clear();
        self.round_confirmed.clear();
    }
}
