//! Roster: participants, prizes and winner records of one session
//!
//! The roster keeps the entity-level invariants:
//! - `0 <= drawn_count <= quantity` for every prize
//! - prize `order` is a dense `0..N-1` permutation, `prizes` sorted by it
//! - `has_won` is true iff a live winner record references the participant
//! - a participant referenced by a winner is never removed
//!
//! Mutators that cannot apply are no-ops reported through `bool`/`Option`;
//! input validation is the caller's job, not an error channel.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{
    Participant, ParticipantId, ParticipantUpdate, Prize, PrizeId, PrizeUpdate, Statistics, Winner,
    WinnerId,
};

/// All entities of a draw session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    participants: Vec<Participant>,
    prizes: Vec<Prize>,
    winners: Vec<Winner>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from restored parts and repair derived fields:
    /// prize order is re-densified, `drawn_count` is recounted from the
    /// winner records, quantity is raised to cover it, and `has_won` follows
    /// the winner references.
    pub fn from_parts(
        participants: Vec<Participant>,
        mut prizes: Vec<Prize>,
        winners: Vec<Winner>,
    ) -> Self {
        prizes.sort_by_key(|p| p.order);
        let mut roster = Self {
            participants,
            prizes,
            winners,
        };
        roster.densify_order();
        for prize in &mut roster.prizes {
            let drawn = roster
                .winners
                .iter()
                .filter(|w| w.prize.id == prize.id)
                .count() as u32;
            prize.drawn_count = drawn;
            prize.quantity = prize.quantity.max(drawn).max(1);
        }
        roster.sync_win_flags();
        roster
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LOOKUPS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Prizes in draw order
    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn winners(&self) -> &[Winner] {
        &self.winners
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn prize(&self, id: &PrizeId) -> Option<&Prize> {
        self.prizes.iter().find(|p| &p.id == id)
    }

    pub fn winner(&self, id: &WinnerId) -> Option<&Winner> {
        self.winners.iter().find(|w| &w.id == id)
    }

    /// Number of live winner records for a participant
    pub fn wins_for(&self, id: &ParticipantId) -> usize {
        self.winners
            .iter()
            .filter(|w| &w.participant.id == id)
            .count()
    }

    /// Lowest-order prize that still has open slots
    pub fn next_prize(&self) -> Option<&Prize> {
        self.prizes.iter().find(|p| !p.is_completed())
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::compute(&self.participants, &self.prizes)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PARTICIPANTS
    // ═══════════════════════════════════════════════════════════════════════

    /// Append a participant. No-op on a blank name.
    pub fn add_participant(
        &mut self,
        name: &str,
        department: &str,
        title: &str,
    ) -> Option<ParticipantId> {
        let participant = Participant::new(name, department, title)?;
        let id = participant.id.clone();
        self.participants.push(participant);
        Some(id)
    }

    /// Replace the participant list. Refused once winner history exists,
    /// since the records would reference participants that no longer exist.
    pub fn set_participants(&mut self, participants: Vec<Participant>) -> bool {
        if !self.winners.is_empty() {
            return false;
        }
        self.participants = participants
            .into_iter()
            .map(|mut p| {
                p.has_won = false;
                p
            })
            .collect();
        true
    }

    pub fn update_participant(&mut self, id: &ParticipantId, update: &ParticipantUpdate) -> bool {
        match self.participants.iter_mut().find(|p| &p.id == id) {
            Some(participant) => {
                update.apply(participant);
                true
            }
            None => false,
        }
    }

    /// Remove a participant that no winner record references
    pub fn remove_participant(&mut self, id: &ParticipantId) -> bool {
        if self.wins_for(id) > 0 {
            return false;
        }
        let before = self.participants.len();
        self.participants.retain(|p| &p.id != id);
        self.participants.len() != before
    }

    /// Clear a stale `has_won` flag. Refused while a winner record still
    /// references the participant.
    pub fn reset_participant_win_status(&mut self, id: &ParticipantId) -> bool {
        if self.wins_for(id) > 0 {
            return false;
        }
        match self.participants.iter_mut().find(|p| &p.id == id) {
            Some(participant) => {
                participant.has_won = false;
                true
            }
            None => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PRIZES
    // ═══════════════════════════════════════════════════════════════════════

    /// Append a prize at the end of the draw order. No-op on a blank name.
    pub fn add_prize(&mut self, name: &str, quantity: u32, exclude_winners: bool) -> Option<PrizeId> {
        let prize = Prize::new(name, quantity, exclude_winners, self.prizes.len())?;
        let id = prize.id.clone();
        self.prizes.push(prize);
        Some(id)
    }

    /// Replace the prize list, keeping the given order. Refused once winner
    /// history exists.
    pub fn set_prizes(&mut self, prizes: Vec<Prize>) -> bool {
        if !self.winners.is_empty() {
            return false;
        }
        self.prizes = prizes
            .into_iter()
            .map(|mut p| {
                p.drawn_count = 0;
                p.quantity = p.quantity.max(1);
                p
            })
            .collect();
        self.densify_order();
        true
    }

    pub fn update_prize(&mut self, id: &PrizeId, update: &PrizeUpdate) -> bool {
        match self.prizes.iter_mut().find(|p| &p.id == id) {
            Some(prize) => {
                update.apply(prize);
                true
            }
            None => false,
        }
    }

    /// Remove a prize with no winner history
    pub fn remove_prize(&mut self, id: &PrizeId) -> bool {
        let Some(index) = self.prizes.iter().position(|p| &p.id == id) else {
            return false;
        };
        if self.prizes[index].drawn_count > 0 {
            return false;
        }
        self.prizes.remove(index);
        self.densify_order();
        true
    }

    /// Add one slot. No-op at the `u32` ceiling.
    pub fn increment_prize_quantity(&mut self, id: &PrizeId) -> bool {
        let Some(prize) = self.prizes.iter_mut().find(|p| &p.id == id) else {
            return false;
        };
        match prize.quantity.checked_add(1) {
            Some(quantity) => {
                prize.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove one slot. No-op when every slot is already drawn or only one
    /// slot is left.
    pub fn decrement_prize_quantity(&mut self, id: &PrizeId) -> bool {
        match self.prizes.iter_mut().find(|p| &p.id == id) {
            Some(prize) if prize.quantity > prize.drawn_count && prize.quantity > 1 => {
                prize.quantity -= 1;
                true
            }
            _ => false,
        }
    }

    /// Reorder prizes to match `ids`. The list must be a permutation of the
    /// current prize ids, otherwise nothing changes.
    pub fn reorder_prizes(&mut self, ids: &[PrizeId]) -> bool {
        if ids.len() != self.prizes.len() {
            return false;
        }
        let unique: HashSet<&PrizeId> = ids.iter().collect();
        if unique.len() != ids.len() || ids.iter().any(|id| self.prize(id).is_none()) {
            return false;
        }

        let mut remaining = std::mem::take(&mut self.prizes);
        for id in ids {
            if let Some(index) = remaining.iter().position(|p| &p.id == id) {
                self.prizes.push(remaining.swap_remove(index));
            }
        }
        self.densify_order();
        true
    }

    /// Re-derive every prize status. `active` is the prize currently being
    /// drawn (or selected).
    pub fn refresh_statuses(&mut self, active: Option<&PrizeId>) {
        for prize in &mut self.prizes {
            let is_active = active == Some(&prize.id);
            prize.refresh_status(is_active);
        }
    }

    fn densify_order(&mut self) {
        for (index, prize) in self.prizes.iter_mut().enumerate() {
            prize.order = index;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // WINNERS
    // ═══════════════════════════════════════════════════════════════════════

    /// Commit a winner: creates the record from value copies, marks the
    /// participant, and takes one slot of the prize. Returns `None` when
    /// either entity is unknown or the prize has no open slot.
    pub fn record_winner(
        &mut self,
        participant_id: &ParticipantId,
        prize_id: &PrizeId,
        drawn_at: DateTime<Utc>,
    ) -> Option<Winner> {
        let participant = self.participant(participant_id)?.clone();
        let prize = self.prize(prize_id)?.clone();
        if prize.is_completed() {
            return None;
        }
        let winner = Winner::confirmed(participant, prize, drawn_at);
        self.commit(winner.clone());
        Some(winner)
    }

    fn commit(&mut self, winner: Winner) {
        if let Some(participant) = self
            .participants
            .iter_mut()
            .find(|p| p.id == winner.participant.id)
        {
            participant.has_won = true;
        }
        if let Some(prize) = self.prizes.iter_mut().find(|p| p.id == winner.prize.id) {
            prize.drawn_count = (prize.drawn_count + 1).min(prize.quantity);
        }
        self.winners.push(winner);
    }

    /// Delete a winner record: frees one slot of its prize (floor 0) and
    /// clears `has_won` unless another record still references the
    /// participant.
    pub fn remove_winner(&mut self, id: &WinnerId) -> Option<Winner> {
        let index = self.winners.iter().position(|w| &w.id == id)?;
        let winner = self.winners.remove(index);

        if let Some(prize) = self.prizes.iter_mut().find(|p| p.id == winner.prize.id) {
            prize.drawn_count = prize.drawn_count.saturating_sub(1);
        }

        let still_won = self.wins_for(&winner.participant.id) > 0;
        if let Some(participant) = self
            .participants
            .iter_mut()
            .find(|p| p.id == winner.participant.id)
        {
            participant.has_won = still_won;
        }

        Some(winner)
    }

    fn sync_win_flags(&mut self) {
        let referenced: HashSet<&ParticipantId> =
            self.winners.iter().map(|w| &w.participant.id).collect();
        for participant in &mut self.participants {
            participant.has_won = referenced.contains(&participant.id);
        }
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.participants.clear();
        self.prizes.clear();
        self.winners.clear();
    }
}
