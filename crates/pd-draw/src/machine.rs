//! Draw state machine
//!
//! ```text
//!            start_draw                settle_draw
//! Standby ─────────────▶ Drawing ─────────────────▶ Confirming ◀──┐
//!    ▲                                                 │   │      │ reject
//!    │ continue / finish / cancel                      │   └──────┘
//!    │                                         confirm │ (pending empty)
//!    └──────────────────────── Revealing ◀─────────────┘
//! ```
//!
//! Every transition validates first and mutates second, so a refused
//! transition leaves the machine and the roster untouched.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use pd_core::{Participant, ParticipantId, PrizeId, Roster, Winner};

use crate::draw::{Draw, DrawMode, SystemState};
use crate::error::{DrawError, DrawResult};
use crate::selection::{Sampler, eligible_pool};

/// Result of a confirm step
#[derive(Debug, Clone, Default)]
pub struct ConfirmOutcome {
    /// Records created, in confirmation order
    pub winners: Vec<Winner>,
    /// Picks dropped because the prize ran out of slots
    pub dropped: Vec<ParticipantId>,
    /// Pending emptied and the machine moved to `Revealing`
    pub revealing: bool,
}

/// What `continue_draw` did after a reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueOutcome {
    /// Prize completed, draw closed
    Finished,
    /// Back to standby, draw kept for the next manual start
    AwaitingTrigger,
    /// Custom mode chained into a new cycle (machine is `Drawing`)
    NextCycle,
    /// Custom mode wanted another cycle but nobody is eligible
    Exhausted,
}

/// Serializable view of the machine, carried in full-state snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub system_state: SystemState,
    pub draw_mode: DrawMode,
    pub custom_draw_count: u32,
    pub current_prize_id: Option<PrizeId>,
    pub current_draw: Option<Draw>,
}

/// Orchestrates draw cycles for one session
#[derive(Debug)]
pub struct DrawMachine {
    state: SystemState,
    mode: DrawMode,
    custom_draw_count: u32,
    current_prize_id: Option<PrizeId>,
    draw: Option<Draw>,
    sampler: Sampler,
}

impl DrawMachine {
    pub fn new(sampler: Sampler) -> Self {
        Self {
            state: SystemState::Standby,
            mode: DrawMode::default(),
            custom_draw_count: 1,
            current_prize_id: None,
            draw: None,
            sampler,
        }
    }

    /// Machine with a deterministic sampler
    pub fn seeded(seed: u64) -> Self {
        Self::new(Sampler::seeded(seed))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // STATE ACCESS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn custom_draw_count(&self) -> u32 {
        self.custom_draw_count
    }

    pub fn current_prize_id(&self) -> Option<&PrizeId> {
        self.current_prize_id.as_ref()
    }

    pub fn draw(&self) -> Option<&Draw> {
        self.draw.as_ref()
    }

    /// Prize whose status reads `in-progress`: the drawn prize, or the
    /// selected one when no draw is open
    pub fn active_prize_id(&self) -> Option<&PrizeId> {
        self.draw
            .as_ref()
            .map(|d| &d.prize_id)
            .or(self.current_prize_id.as_ref())
    }

    pub fn pending(&self) -> &[Participant] {
        self.draw
            .as_ref()
            .map(|d| d.pending_participants.as_slice())
            .unwrap_or(&[])
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler {
        &mut self.sampler
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            system_state: self.state,
            draw_mode: self.mode,
            custom_draw_count: self.custom_draw_count,
            current_prize_id: self.current_prize_id.clone(),
            current_draw: self.draw.clone(),
        }
    }

    /// Replace the machine state wholesale (snapshot apply / restore).
    /// The sampler is kept. A snapshot taken mid-`Drawing` comes back
    /// settled: its staged picks are pending and the state is `Confirming`.
    pub fn restore(&mut self, snapshot: MachineSnapshot) {
        self.state = snapshot.system_state;
        self.mode = snapshot.draw_mode;
        self.custom_draw_count = snapshot.custom_draw_count.max(1);
        self.current_prize_id = snapshot.current_prize_id;
        self.draw = snapshot.current_draw;

        match (self.state, self.draw.as_mut()) {
            (SystemState::Standby, _) => {}
            (_, None) => self.state = SystemState::Standby,
            (SystemState::Drawing, Some(draw)) => {
                draw.pending_participants = std::mem::take(&mut draw.staged_participants);
                self.state = SystemState::Confirming;
            }
            _ => {}
        }
    }

    /// Back to a fresh standby machine, keeping mode settings
    pub fn reset(&mut self) {
        self.state = SystemState::Standby;
        self.current_prize_id = None;
        self.draw = None;
    }

    /// Forget the selected prize. The prize of an open draw stays active.
    pub fn clear_selection(&mut self) {
        self.current_prize_id = None;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SETTINGS
    // ═══════════════════════════════════════════════════════════════════════

    /// Change the draw mode. Refused while picks are being drawn or decided.
    pub fn set_mode(&mut self, mode: DrawMode) -> DrawResult<()> {
        self.require_idle("change draw mode")?;
        self.mode = mode;
        Ok(())
    }

    /// Target confirmations per manual start in custom mode (at least 1)
    pub fn set_custom_draw_count(&mut self, count: u32) -> DrawResult<()> {
        self.require_idle("change custom draw count")?;
        self.custom_draw_count = count.max(1);
        Ok(())
    }

    /// Select the prize the console is about to draw. `None` clears it.
    pub fn select_prize(&mut self, roster: &Roster, prize_id: Option<PrizeId>) -> DrawResult<()> {
        if self.state != SystemState::Standby {
            return Err(self.invalid("select a prize"));
        }
        if let Some(id) = &prize_id {
            if roster.prize(id).is_none() {
                return Err(DrawError::UnknownPrize(id.to_string()));
            }
            self.require_same_prize(id)?;
        }
        self.current_prize_id = prize_id;
        Ok(())
    }

    fn require_idle(&self, action: &'static str) -> DrawResult<()> {
        match self.state {
            SystemState::Standby | SystemState::Revealing => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn require_same_prize(&self, prize_id: &PrizeId) -> DrawResult<()> {
        match &self.draw {
            Some(draw) if &draw.prize_id != prize_id => {
                Err(DrawError::DrawInProgress(draw.prize_id.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn invalid(&self, action: &'static str) -> DrawError {
        DrawError::InvalidTransition {
            state: self.state,
            action,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TRANSITIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Standby → Drawing → Confirming in one call
    pub fn start_draw(&mut self, roster: &Roster, prize_id: &PrizeId) -> DrawResult<&[Participant]> {
        self.begin_draw(roster, prize_id)?;
        self.settle_draw()
    }

    /// Standby → Drawing. Samples once and stages the picks; the display
    /// may animate before [`Self::settle_draw`] applies them unchanged.
    pub fn begin_draw(&mut self, roster: &Roster, prize_id: &PrizeId) -> DrawResult<usize> {
        if self.state != SystemState::Standby {
            return Err(self.invalid("start a draw"));
        }
        self.require_same_prize(prize_id)?;

        let picks = self.sample_round(roster, prize_id)?;
        let staged = picks.len();

        let draw = self
            .draw
            .get_or_insert_with(|| Draw::new(prize_id.clone()));
        draw.batch_start = draw.confirmed_count;
        draw.open_round(picks);

        self.current_prize_id = Some(prize_id.clone());
        self.state = SystemState::Drawing;
        log::info!("Draw started for prize {}: {} staged", prize_id, staged);
        Ok(staged)
    }

    /// Drawing → Confirming: staged picks become pending
    pub fn settle_draw(&mut self) -> DrawResult<&[Participant]> {
        if self.state != SystemState::Drawing {
            return Err(self.invalid("settle a draw"));
        }
        let draw = self.draw.as_mut().ok_or(DrawError::NoActiveDraw)?;
        draw.pending_participants = std::mem::take(&mut draw.staged_participants);
        self.state = SystemState::Confirming;
        Ok(draw.pending_participants.as_slice())
    }

    /// Confirm pending picks. `None` (or an empty list) confirms all of
    /// them; ids that are not pending are ignored.
    pub fn confirm(
        &mut self,
        roster: &mut Roster,
        ids: Option<&[ParticipantId]>,
    ) -> DrawResult<ConfirmOutcome> {
        if self.state != SystemState::Confirming {
            return Err(self.invalid("confirm"));
        }
        let draw = self.draw.as_mut().ok_or(DrawError::NoActiveDraw)?;
        let prize = roster
            .prize(&draw.prize_id)
            .ok_or_else(|| DrawError::UnknownPrize(draw.prize_id.to_string()))?;
        let prize_id = prize.id.clone();
        let mut slots = prize.remaining();

        let targets: Vec<Participant> = match ids {
            Some(ids) if !ids.is_empty() => draw
                .pending_participants
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect(),
            _ => draw.pending_participants.clone(),
        };
        if targets.is_empty() {
            let wanted = ids
                .unwrap_or_default()
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(DrawError::NotPending(wanted));
        }

        let now = Utc::now();
        let mut outcome = ConfirmOutcome::default();
        for participant in &targets {
            let committed = if slots > 0 {
                roster.record_winner(&participant.id, &prize_id, now)
            } else {
                None
            };
            match committed {
                Some(winner) => {
                    slots -= 1;
                    draw.drawn_participants.push(winner.participant.clone());
                    draw.round_confirmed.push(winner.participant.clone());
                    draw.confirmed_count += 1;
                    outcome.winners.push(winner);
                }
                None => outcome.dropped.push(participant.id.clone()),
            }
        }

        let target_ids: HashSet<&ParticipantId> = targets.iter().map(|p| &p.id).collect();
        draw.pending_participants
            .retain(|p| !target_ids.contains(&p.id));

        if draw.pending_participants.is_empty() {
            draw.reveal_participants = draw.round_confirmed.clone();
            self.state = SystemState::Revealing;
            outcome.revealing = true;
        }

        log::info!(
            "Confirmed {} winner(s) for prize {} ({} dropped)",
            outcome.winners.len(),
            prize_id,
            outcome.dropped.len()
        );
        Ok(outcome)
    }

    /// Reject a pending pick and draw a replacement. The rejected
    /// participant gets no winner record and no `has_won` change. Returns
    /// the replacement, if anyone was left to draw.
    pub fn reject(
        &mut self,
        roster: &Roster,
        participant_id: &ParticipantId,
    ) -> DrawResult<Option<Participant>> {
        if self.state != SystemState::Confirming {
            return Err(self.invalid("reject"));
        }
        let draw = self.draw.as_mut().ok_or(DrawError::NoActiveDraw)?;
        if !draw.is_pending(participant_id) {
            return Err(DrawError::NotPending(participant_id.to_string()));
        }
        let prize = roster
            .prize(&draw.prize_id)
            .ok_or_else(|| DrawError::UnknownPrize(draw.prize_id.to_string()))?;

        draw.pending_participants.retain(|p| &p.id != participant_id);
        draw.rejected.push(participant_id.clone());

        // Multi-pick tops the batch back up; single-pick discards and
        // redraws. Either way the new pick avoids everyone seen this round.
        let pool = eligible_pool(prize, roster.participants());
        let exclude = draw.round_exclusions();
        let replacement = self.sampler.sample(&pool, 1, &exclude).into_iter().next();

        if let Some(pick) = &replacement {
            draw.pending_participants.push(pick.clone());
        } else if draw.pending_participants.is_empty() {
            if draw.round_confirmed.is_empty() {
                self.state = SystemState::Standby;
                log::warn!("No replacement left for prize {}", draw.prize_id);
            } else {
                draw.reveal_participants = draw.round_confirmed.clone();
                self.state = SystemState::Revealing;
            }
        }

        log::debug!(
            "Rejected {} (mode {:?}), replacement: {:?}",
            participant_id,
            self.mode,
            replacement.as_ref().map(|p| p.id.to_string())
        );
        Ok(replacement)
    }

    /// Leave the reveal: close a completed prize, chain the next custom
    /// cycle, or go back to standby for a manual restart.
    pub fn continue_draw(&mut self, roster: &Roster) -> DrawResult<ContinueOutcome> {
        if self.state != SystemState::Revealing {
            return Err(self.invalid("continue"));
        }
        let draw = self.draw.as_ref().ok_or(DrawError::NoActiveDraw)?;
        let prize_id = draw.prize_id.clone();
        let completed = roster.prize(&prize_id).is_none_or(|p| p.is_completed());

        if completed {
            self.draw = None;
            self.state = SystemState::Standby;
            log::info!("Prize {} completed", prize_id);
            return Ok(ContinueOutcome::Finished);
        }

        if self.mode == DrawMode::Custom && draw.batch_confirmed() < self.custom_draw_count {
            return match self.sample_round(roster, &prize_id) {
                Ok(picks) => {
                    if let Some(draw) = self.draw.as_mut() {
                        draw.open_round(picks);
                    }
                    self.state = SystemState::Drawing;
                    Ok(ContinueOutcome::NextCycle)
                }
                Err(DrawError::NoEligibleParticipants(_)) => {
                    self.state = SystemState::Standby;
                    Ok(ContinueOutcome::Exhausted)
                }
                Err(err) => Err(err),
            };
        }

        self.state = SystemState::Standby;
        Ok(ContinueOutcome::AwaitingTrigger)
    }

    /// Close the prize session early (operator decision)
    pub fn finish_draw(&mut self) -> DrawResult<()> {
        match self.state {
            SystemState::Standby | SystemState::Revealing => {}
            _ => return Err(self.invalid("finish the draw")),
        }
        let draw = self.draw.take().ok_or(DrawError::NoActiveDraw)?;
        self.state = SystemState::Standby;
        log::info!(
            "Draw for prize {} finished after {} confirmation(s)",
            draw.prize_id,
            draw.confirmed_count
        );
        Ok(())
    }

    /// Discard the active draw and any undecided picks. Confirmed winners
    /// are untouched; they can only be removed explicitly.
    pub fn cancel(&mut self) -> DrawResult<()> {
        if self.draw.is_none() && self.state == SystemState::Standby {
            return Err(DrawError::NoActiveDraw);
        }
        if let Some(draw) = self.draw.take() {
            log::info!(
                "Draw for prize {} cancelled with {} pick(s) pending",
                draw.prize_id,
                draw.pending_participants.len()
            );
        }
        self.state = SystemState::Standby;
        Ok(())
    }

    /// Validate the prize and sample a fresh round for it
    fn sample_round(&mut self, roster: &Roster, prize_id: &PrizeId) -> DrawResult<Vec<Participant>> {
        let prize = roster
            .prize(prize_id)
            .ok_or_else(|| DrawError::UnknownPrize(prize_id.to_string()))?;
        if prize.is_completed() {
            return Err(DrawError::PrizeCompleted(prize_id.to_string()));
        }

        let pool = eligible_pool(prize, roster.participants());
        let picks = self
            .sampler
            .sample(&pool, self.mode.batch_size(prize.remaining()), &HashSet::new());
        if picks.is_empty() {
            log::warn!("No eligible participants for prize {}", prize.name);
            return Err(DrawError::NoEligibleParticipants(prize_id.to_string()));
        }
        Ok(picks)
    }
}

impl Default for DrawMachine {
    fn default() -> Self {
        Self::new(Sampler::from_entropy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::PrizeStatus;

    fn setup(names: &[&str], quantity: u32, exclude: bool) -> (Roster, PrizeId) {
        let mut roster = Roster::new();
        for name in names {
            roster.add_participant(name, "Ops", "Staff").unwrap();
        }
        let prize = roster.add_prize("Laptop", quantity, exclude).unwrap();
        (roster, prize)
    }

    fn pending_ids(machine: &DrawMachine) -> Vec<ParticipantId> {
        machine.pending().iter().map(|p| p.id.clone()).collect()
    }

    fn assert_bounds(roster: &Roster) {
        for prize in roster.prizes() {
            assert!(prize.drawn_count <= prize.quantity);
        }
        for participant in roster.participants() {
            assert_eq!(participant.has_won, roster.wins_for(&participant.id) > 0);
        }
    }

    #[test]
    fn test_one_mode_three_cycles_complete_prize() {
        let (mut roster, prize) = setup(&["A", "B", "C", "D"], 3, true);
        let mut machine = DrawMachine::seeded(5);

        for round in 1..=3u32 {
            machine.start_draw(&roster, &prize).unwrap();
            assert_eq!(machine.state(), SystemState::Confirming);
            assert_eq!(machine.pending().len(), 1);

            let outcome = machine.confirm(&mut roster, None).unwrap();
            assert_eq!(outcome.winners.len(), 1);
            assert!(outcome.revealing);
            assert!(roster.participant(&outcome.winners[0].participant.id).unwrap().has_won);
            assert_eq!(roster.prize(&prize).unwrap().drawn_count, round);

            roster.refresh_statuses(machine.active_prize_id());
            if round < 3 {
                assert_eq!(roster.prize(&prize).unwrap().status, PrizeStatus::InProgress);
                assert_eq!(machine.continue_draw(&roster).unwrap(), ContinueOutcome::AwaitingTrigger);
                roster.refresh_statuses(None);
                assert_eq!(roster.prize(&prize).unwrap().status, PrizeStatus::Incomplete);
            } else {
                assert_eq!(machine.continue_draw(&roster).unwrap(), ContinueOutcome::Finished);
            }
            assert_bounds(&roster);
        }

        assert!(machine.draw().is_none());
        assert_eq!(machine.state(), SystemState::Standby);
        assert_eq!(roster.prize(&prize).unwrap().status, PrizeStatus::Completed);
        let winners: HashSet<_> = roster.winners().iter().map(|w| &w.participant.id).collect();
        assert_eq!(winners.len(), 3);

        // Completed prize refuses another start
        assert_eq!(
            machine.start_draw(&roster, &prize).unwrap_err(),
            DrawError::PrizeCompleted(prize.to_string())
        );
    }

    #[test]
    fn test_all_mode_draws_remaining_slots() {
        let (mut roster, prize) = setup(&["A", "B", "C", "D", "E"], 3, true);
        let mut machine = DrawMachine::seeded(8);
        machine.set_mode(DrawMode::All).unwrap();

        machine.start_draw(&roster, &prize).unwrap();
        assert_eq!(machine.pending().len(), 3);

        // Confirm one by one; machine stays in confirming until pending empties
        let ids = pending_ids(&machine);
        machine.confirm(&mut roster, Some(&ids[..1])).unwrap();
        assert_eq!(machine.state(), SystemState::Confirming);
        assert_eq!(machine.pending().len(), 2);

        let outcome = machine.confirm(&mut roster, None).unwrap();
        assert!(outcome.revealing);
        assert_eq!(machine.draw().unwrap().reveal_participants.len(), 3);
        assert_eq!(machine.draw().unwrap().confirmed_count, 3);
        assert_eq!(roster.prize(&prize).unwrap().drawn_count, 3);
        assert_bounds(&roster);
    }

    #[test]
    fn test_confirm_unknown_id_is_noop() {
        let (mut roster, prize) = setup(&["A", "B"], 1, true);
        let mut machine = DrawMachine::seeded(1);
        machine.start_draw(&roster, &prize).unwrap();

        let stranger = ParticipantId::from("nobody");
        let err = machine.confirm(&mut roster, Some(&[stranger])).unwrap_err();
        assert!(matches!(err, DrawError::NotPending(_)));
        assert_eq!(machine.state(), SystemState::Confirming);
        assert!(roster.winners().is_empty());
    }

    #[test]
    fn test_confirm_outside_confirming_is_refused() {
        let (mut roster, _) = setup(&["A"], 1, true);
        let mut machine = DrawMachine::seeded(1);
        let err = machine.confirm(&mut roster, None).unwrap_err();
        assert_eq!(
            err,
            DrawError::InvalidTransition {
                state: SystemState::Standby,
                action: "confirm"
            }
        );
    }

    #[test]
    fn test_reject_resamples_without_side_effects() {
        let (mut roster, prize) = setup(&["A", "B", "C"], 1, true);
        let mut machine = DrawMachine::seeded(3);
        machine.start_draw(&roster, &prize).unwrap();
        let first = pending_ids(&machine)[0].clone();

        let replacement = machine.reject(&roster, &first).unwrap().unwrap();
        assert_ne!(replacement.id, first);
        assert_eq!(pending_ids(&machine), vec![replacement.id.clone()]);
        assert!(roster.winners().is_empty());
        assert!(!roster.participant(&first).unwrap().has_won);
        assert_eq!(roster.prize(&prize).unwrap().drawn_count, 0);

        // Second reject avoids both rejected participants
        let second = machine.reject(&roster, &replacement.id).unwrap().unwrap();
        assert_ne!(second.id, first);
        assert_ne!(second.id, replacement.id);

        // Nobody left: falls back to standby
        assert!(machine.reject(&roster, &second.id).unwrap().is_none());
        assert_eq!(machine.state(), SystemState::Standby);
        assert_eq!(roster.prize(&prize).unwrap().drawn_count, 0);
        assert!(roster.winners().is_empty());
    }

    #[test]
    fn test_reject_in_all_mode_tops_up_batch() {
        let (mut roster, prize) = setup(&["A", "B", "C", "D", "E", "F"], 2, true);
        let mut machine = DrawMachine::seeded(4);
        machine.set_mode(DrawMode::All).unwrap();
        machine.start_draw(&roster, &prize).unwrap();

        let before = pending_ids(&machine);
        let replacement = machine.reject(&roster, &before[0]).unwrap().unwrap();
        let after = pending_ids(&machine);
        assert_eq!(after.len(), 2);
        assert!(after.contains(&before[1]));
        assert!(!after.contains(&before[0]));
        assert!(!before.contains(&replacement.id));

        machine.confirm(&mut roster, None).unwrap();
        assert_eq!(roster.prize(&prize).unwrap().drawn_count, 2);
        assert!(!roster.participant(&before[0]).unwrap().has_won);
        assert_bounds(&roster);
    }

    #[test]
    fn test_custom_mode_chains_cycles() {
        let (mut roster, prize) = setup(&["A", "B", "C", "D", "E"], 5, true);
        let mut machine = DrawMachine::seeded(9);
        machine.set_mode(DrawMode::Custom).unwrap();
        machine.set_custom_draw_count(2).unwrap();

        machine.start_draw(&roster, &prize).unwrap();
        machine.confirm(&mut roster, None).unwrap();
        assert_eq!(machine.continue_draw(&roster).unwrap(), ContinueOutcome::NextCycle);
        assert_eq!(machine.state(), SystemState::Drawing);
        machine.settle_draw().unwrap();
        machine.confirm(&mut roster, None).unwrap();

        // Two confirmations reached: back to standby, draw kept
        assert_eq!(machine.continue_draw(&roster).unwrap(), ContinueOutcome::AwaitingTrigger);
        assert_eq!(machine.draw().unwrap().confirmed_count, 2);
        assert_eq!(machine.draw().unwrap().drawn_participants.len(), 2);

        // Manual restart extends the same draw and resets the batch
        machine.start_draw(&roster, &prize).unwrap();
        assert_eq!(machine.draw().unwrap().batch_confirmed(), 0);
        assert_eq!(roster.prize(&prize).unwrap().drawn_count, 2);
    }

    #[test]
    fn test_empty_pool_stays_in_standby() {
        let (mut roster, prize) = setup(&["A"], 2, true);
        let mut machine = DrawMachine::seeded(2);
        machine.start_draw(&roster, &prize).unwrap();
        machine.confirm(&mut roster, None).unwrap();
        machine.continue_draw(&roster).unwrap();

        let err = machine.start_draw(&roster, &prize).unwrap_err();
        assert_eq!(err, DrawError::NoEligibleParticipants(prize.to_string()));
        assert_eq!(machine.state(), SystemState::Standby);
    }

    #[test]
    fn test_including_winners_allows_repeat() {
        let (mut roster, prize) = setup(&["A"], 2, false);
        let mut machine = DrawMachine::seeded(2);
        for _ in 0..2 {
            machine.start_draw(&roster, &prize).unwrap();
            machine.confirm(&mut roster, None).unwrap();
            machine.continue_draw(&roster).unwrap();
        }
        assert_eq!(roster.winners().len(), 2);
        assert_eq!(roster.prize(&prize).unwrap().drawn_count, 2);
    }

    #[test]
    fn test_cancel_discards_picks_only() {
        let (mut roster, prize) = setup(&["A", "B", "C"], 3, true);
        let mut machine = DrawMachine::seeded(6);
        machine.set_mode(DrawMode::All).unwrap();
        machine.start_draw(&roster, &prize).unwrap();
        let ids = pending_ids(&machine);
        machine.confirm(&mut roster, Some(&ids[..1])).unwrap();

        machine.cancel().unwrap();
        assert!(machine.draw().is_none());
        assert_eq!(machine.state(), SystemState::Standby);
        assert_eq!(roster.winners().len(), 1);
        assert_eq!(roster.prize(&prize).unwrap().drawn_count, 1);
        assert!(!roster.participant(&ids[1]).unwrap().has_won);

        assert_eq!(machine.cancel().unwrap_err(), DrawError::NoActiveDraw);
    }

    #[test]
    fn test_draw_for_other_prize_is_refused() {
        let (mut roster, prize) = setup(&["A", "B"], 2, true);
        let other = roster.add_prize("Mug", 1, true).unwrap();
        let mut machine = DrawMachine::seeded(6);

        machine.start_draw(&roster, &prize).unwrap();
        machine.confirm(&mut roster, None).unwrap();
        machine.continue_draw(&roster).unwrap();

        assert!(matches!(
            machine.start_draw(&roster, &other),
            Err(DrawError::DrawInProgress(_))
        ));
        machine.finish_draw().unwrap();
        machine.start_draw(&roster, &other).unwrap();
        assert_eq!(machine.active_prize_id(), Some(&other));
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let (roster, prize) = setup(&["A", "B"], 2, true);
        let mut machine = DrawMachine::seeded(6);
        machine.start_draw(&roster, &prize).unwrap();

        let snapshot = machine.snapshot();
        let mut replica = DrawMachine::seeded(0);
        replica.restore(snapshot.clone());
        assert_eq!(replica.snapshot(), snapshot);
        assert_eq!(replica.state(), SystemState::Confirming);
    }

    #[test]
    fn test_restore_settles_drawing_snapshot() {
        let (mut roster, prize) = setup(&["A", "B", "C"], 2, true);
        let mut machine = DrawMachine::seeded(12);
        machine.begin_draw(&roster, &prize).unwrap();
        let staged = machine.draw().unwrap().staged_participants.clone();
        assert_eq!(staged.len(), 1);

        let mut replica = DrawMachine::seeded(0);
        replica.restore(machine.snapshot());
        assert_eq!(replica.state(), SystemState::Confirming);
        assert_eq!(replica.pending(), staged.as_slice());
        assert!(replica.draw().unwrap().staged_participants.is_empty());

        // The staged pick is the one confirmed, no resampling
        let outcome = replica.confirm(&mut roster, None).unwrap();
        assert_eq!(outcome.winners[0].participant.id, staged[0].id);
        assert_bounds(&roster);
    }

    #[test]
    fn test_clear_selection_keeps_open_draw_active() {
        let (roster, prize) = setup(&["A", "B"], 2, true);
        let mut machine = DrawMachine::seeded(3);
        machine.select_prize(&roster, Some(prize.clone())).unwrap();
        machine.clear_selection();
        assert!(machine.active_prize_id().is_none());

        machine.start_draw(&roster, &prize).unwrap();
        machine.clear_selection();
        assert_eq!(machine.active_prize_id(), Some(&prize));
    }
}
