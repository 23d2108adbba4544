//! Session store
//!
//! The single writer of a draw event. Every public mutator either applies
//! completely and commits, or changes nothing. A commit:
//! 1. re-derives prize statuses against the active prize
//! 2. recomputes statistics
//! 3. bumps the revision
//! 4. pushes the new `FullState` to every subscriber
//! 5. rewrites the auto-backup slots (best effort)

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use pd_core::{
    CustomAssets, CustomAssetsPatch, DisplaySettings, DisplaySettingsPatch, Participant,
    ParticipantId, ParticipantUpdate, PdError, PdResult, Prize, PrizeId, PrizeUpdate, Roster,
    Statistics, Winner, WinnerExportRow, WinnerId,
};
use pd_draw::{
    ConfirmOutcome, ContinueOutcome, Draw, DrawMachine, DrawMode, DrawResult, MachineSnapshot,
    Sampler, SystemState,
};

use crate::{
    BackupManager, DisplaySettingsPayload, FsBackupStore, FullState, ImportOutcome, ImportReport,
    RestoredSession, SessionConfig, SnapshotSink, Subscribers, SubscriptionId, TabularRow,
    callback_sink, parse_participants, parse_prizes, parse_winner_rows, resolve_winners,
};

// ============ Session Store ============

/// Authoritative state of one draw event
#[derive(Debug)]
pub struct SessionStore {
    roster: Roster,
    machine: DrawMachine,
    custom_assets: CustomAssets,
    display_settings: DisplaySettings,
    statistics: Statistics,
    revision: u64,
    subscribers: Subscribers,
    backup: Option<BackupManager>,
    last_backup_ok: bool,
}

impl SessionStore {
    /// Empty session with an OS-seeded sampler and no backups
    pub fn new() -> Self {
        Self::with_sampler(Sampler::from_entropy())
    }

    pub fn with_sampler(sampler: Sampler) -> Self {
        Self {
            roster: Roster::new(),
            machine: DrawMachine::new(sampler),
            custom_assets: CustomAssets::default(),
            display_settings: DisplaySettings::default(),
            statistics: Statistics::default(),
            revision: 0,
            subscribers: Subscribers::new(),
            backup: None,
            last_backup_ok: true,
        }
    }

    /// Session set up from a config: mode, seed and filesystem backups
    pub fn with_config(config: &SessionConfig) -> Self {
        let mut store = Self::with_sampler(config.sampler());
        store.machine.restore(MachineSnapshot {
            system_state: SystemState::Standby,
            draw_mode: config.draw_mode,
            custom_draw_count: config.custom_draw_count,
            current_prize_id: None,
            current_draw: None,
        });
        if config.auto_backup {
            let store_dir = FsBackupStore::new(config.backup_dir.clone());
            store.backup = Some(BackupManager::new(Arc::new(store_dir)));
        }
        store
    }

    /// Attach a backup manager; every later commit writes the auto slots
    pub fn with_backup(mut self, manager: BackupManager) -> Self {
        self.backup = Some(manager);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // STATE ACCESS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn participants(&self) -> &[Participant] {
        self.roster.participants()
    }

    pub fn prizes(&self) -> &[Prize] {
        self.roster.prizes()
    }

    pub fn winners(&self) -> &[Winner] {
        self.roster.winners()
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn system_state(&self) -> SystemState {
        self.machine.state()
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.machine.mode()
    }

    pub fn current_draw(&self) -> Option<&Draw> {
        self.machine.draw()
    }

    pub fn current_prize_id(&self) -> Option<&PrizeId> {
        self.machine.current_prize_id()
    }

    pub fn custom_assets(&self) -> &CustomAssets {
        &self.custom_assets
    }

    pub fn display_settings(&self) -> &DisplaySettings {
        &self.display_settings
    }

    pub fn backup(&self) -> Option<&BackupManager> {
        self.backup.as_ref()
    }

    /// Whether the most recent auto-backup wrote every slot
    pub fn last_backup_ok(&self) -> bool {
        self.last_backup_ok
    }

    /// Immutable copy of the whole session
    pub fn full_state(&self) -> FullState {
        let machine = self.machine.snapshot();
        FullState {
            revision: self.revision,
            participants: self.roster.participants().to_vec(),
            prizes: self.roster.prizes().to_vec(),
            current_prize_id: machine.current_prize_id,
            winners: self.roster.winners().to_vec(),
            current_draw: machine.current_draw,
            draw_mode: machine.draw_mode,
            custom_draw_count: machine.custom_draw_count,
            system_state: machine.system_state,
            statistics: self.statistics,
            custom_assets: self.custom_assets.clone(),
            display_settings: self.display_settings.clone(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SUBSCRIPTIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Register a sink. It immediately receives the current state. Sinks
    /// run under the store's lock and must not call back into the session.
    pub fn subscribe(&mut self, sink: Arc<dyn SnapshotSink>) -> SubscriptionId {
        sink.push_snapshot(Arc::new(self.full_state()));
        self.subscribers.subscribe(sink)
    }

    pub fn subscribe_fn<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(Arc<FullState>) + Send + Sync + 'static,
    {
        self.subscribe(callback_sink(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // COMMIT
    // ═══════════════════════════════════════════════════════════════════════

    /// Re-derive statuses and statistics without committing
    pub fn recompute_statistics(&mut self) -> Statistics {
        self.roster.refresh_statuses(self.machine.active_prize_id());
        self.statistics = self.roster.statistics();
        self.statistics
    }

    fn commit(&mut self) {
        self.recompute_statistics();
        self.revision += 1;

        let state = Arc::new(self.full_state());
        self.subscribers.notify(&state);

        if let Some(manager) = &self.backup {
            let ok = manager.save_auto_backup(&self.roster);
            if !ok {
                log::warn!("Auto backup failed at revision {}", self.revision);
            }
            self.last_backup_ok = ok;
        }
    }

    fn commit_if(&mut self, changed: bool) -> bool {
        if changed {
            self.commit();
        }
        changed
    }

    fn draw_idle(&self) -> bool {
        self.machine.draw().is_none() && self.machine.state() == SystemState::Standby
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PARTICIPANTS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_participant(
        &mut self,
        name: &str,
        department: &str,
        title: &str,
    ) -> Option<ParticipantId> {
        let id = self.roster.add_participant(name, department, title)?;
        self.commit();
        Some(id)
    }

    /// Replace all participants. Refused once winners exist or while a
    /// draw is open.
    pub fn set_participants(&mut self, participants: Vec<Participant>) -> bool {
        if !self.draw_idle() {
            return false;
        }
        let changed = self.roster.set_participants(participants);
        self.commit_if(changed)
    }

    pub fn update_participant(&mut self, id: &ParticipantId, update: &ParticipantUpdate) -> bool {
        let changed = self.roster.update_participant(id, update);
        self.commit_if(changed)
    }

    /// Refused for winners and for picks awaiting a decision
    pub fn remove_participant(&mut self, id: &ParticipantId) -> bool {
        if self.machine.draw().is_some_and(|d| d.is_pending(id)) {
            return false;
        }
        let changed = self.roster.remove_participant(id);
        self.commit_if(changed)
    }

    pub fn reset_participant_win_status(&mut self, id: &ParticipantId) -> bool {
        let changed = self.roster.reset_participant_win_status(id);
        self.commit_if(changed)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PRIZES
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_prize(&mut self, name: &str, quantity: u32, exclude_winners: bool) -> Option<PrizeId> {
        let id = self.roster.add_prize(name, quantity, exclude_winners)?;
        self.commit();
        Some(id)
    }

    pub fn set_prizes(&mut self, prizes: Vec<Prize>) -> bool {
        if !self.draw_idle() {
            return false;
        }
        let changed = self.roster.set_prizes(prizes);
        if changed {
            // The old selection no longer exists
            self.machine.clear_selection();
        }
        self.commit_if(changed)
    }

    pub fn update_prize(&mut self, id: &PrizeId, update: &PrizeUpdate) -> bool {
        let changed = self.roster.update_prize(id, update);
        self.commit_if(changed)
    }

    /// Refused for the active prize and for prizes with winners
    pub fn remove_prize(&mut self, id: &PrizeId) -> bool {
        if self.machine.active_prize_id() == Some(id) {
            return false;
        }
        let changed = self.roster.remove_prize(id);
        self.commit_if(changed)
    }

    pub fn increment_prize_quantity(&mut self, id: &PrizeId) -> bool {
        let changed = self.roster.increment_prize_quantity(id);
        self.commit_if(changed)
    }

    pub fn decrement_prize_quantity(&mut self, id: &PrizeId) -> bool {
        let changed = self.roster.decrement_prize_quantity(id);
        self.commit_if(changed)
    }

    pub fn reorder_prizes(&mut self, ids: &[PrizeId]) -> bool {
        let changed = self.roster.reorder_prizes(ids);
        self.commit_if(changed)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // WINNERS
    // ═══════════════════════════════════════════════════════════════════════

    /// Delete a winner record: frees the prize slot and re-derives the
    /// participant's `has_won` from the remaining records.
    pub fn remove_winner(&mut self, id: &WinnerId) -> PdResult<Winner> {
        let winner = self
            .roster
            .remove_winner(id)
            .ok_or_else(|| PdError::UnknownWinner(id.to_string()))?;
        log::info!(
            "Winner {} removed ({} / {})",
            id,
            winner.prize.name,
            winner.participant.name
        );
        self.commit();
        Ok(winner)
    }

    pub fn export_winners(&self) -> Vec<WinnerExportRow> {
        self.roster.winners().iter().map(WinnerExportRow::from).collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DRAW
    // ═══════════════════════════════════════════════════════════════════════

    pub fn select_prize(&mut self, prize_id: Option<PrizeId>) -> DrawResult<()> {
        self.machine.select_prize(&self.roster, prize_id)?;
        self.commit();
        Ok(())
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) -> DrawResult<()> {
        self.machine.set_mode(mode)?;
        self.commit();
        Ok(())
    }

    pub fn set_custom_draw_count(&mut self, count: u32) -> DrawResult<()> {
        self.machine.set_custom_draw_count(count)?;
        self.commit();
        Ok(())
    }

    /// Sample picks for a prize. Subscribers see the `Drawing` revision
    /// first, then the `Confirming` revision with the same picks pending.
    pub fn start_draw(&mut self, prize_id: &PrizeId) -> DrawResult<Vec<Participant>> {
        self.machine.begin_draw(&self.roster, prize_id)?;
        self.commit();
        self.settle()
    }

    fn settle(&mut self) -> DrawResult<Vec<Participant>> {
        let pending = self.machine.settle_draw()?.to_vec();
        self.commit();
        Ok(pending)
    }

    /// Confirm pending picks; `None` confirms all of them
    pub fn confirm(&mut self, ids: Option<&[ParticipantId]>) -> DrawResult<ConfirmOutcome> {
        let outcome = self.machine.confirm(&mut self.roster, ids)?;
        self.commit();
        Ok(outcome)
    }

    /// Reject a pending pick and draw a replacement
    pub fn reject(&mut self, participant_id: &ParticipantId) -> DrawResult<Option<Participant>> {
        let replacement = self.machine.reject(&self.roster, participant_id)?;
        self.commit();
        Ok(replacement)
    }

    /// Leave the reveal. A chained custom cycle is settled here, so the
    /// machine is back in `Confirming` when this returns `NextCycle`.
    pub fn continue_draw(&mut self) -> DrawResult<ContinueOutcome> {
        let outcome = self.machine.continue_draw(&self.roster)?;
        self.commit();
        if outcome == ContinueOutcome::NextCycle {
            self.settle()?;
        }
        Ok(outcome)
    }

    pub fn finish_draw(&mut self) -> DrawResult<()> {
        self.machine.finish_draw()?;
        self.commit();
        Ok(())
    }

    pub fn cancel_draw(&mut self) -> DrawResult<()> {
        self.machine.cancel()?;
        self.commit();
        Ok(())
    }

    /// Reseed the sampler (rehearsals, replays)
    pub fn reseed(&mut self, seed: u64) {
        self.machine.sampler_mut().reseed(seed);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DISPLAY CUSTOMISATION
    // ═══════════════════════════════════════════════════════════════════════

    pub fn set_custom_assets(&mut self, patch: &CustomAssetsPatch) {
        self.custom_assets.merge(patch);
        self.persist_display_settings();
        self.commit();
    }

    pub fn update_display_settings(&mut self, patch: &DisplaySettingsPatch) {
        self.display_settings.merge(patch);
        self.persist_display_settings();
        self.commit();
    }

    fn persist_display_settings(&self) {
        if let Some(manager) = &self.backup {
            let payload = DisplaySettingsPayload::new(
                self.custom_assets.clone(),
                self.display_settings.clone(),
            );
            if !manager.save_display_settings(&payload) {
                log::warn!("Display settings not persisted");
            }
        }
    }

    /// Pick up display customisation saved by an earlier session
    pub fn load_display_settings(&mut self) -> bool {
        let Some(payload) = self.backup.as_ref().and_then(|m| m.load_display_settings()) else {
            return false;
        };
        self.custom_assets = payload.custom_assets;
        self.display_settings = payload.display_settings;
        self.commit();
        true
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SESSION LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════

    /// Back to an empty session with default settings
    pub fn reset_all(&mut self) {
        self.roster.clear();
        self.machine.restore(MachineSnapshot {
            system_state: SystemState::Standby,
            draw_mode: DrawMode::default(),
            custom_draw_count: 1,
            current_prize_id: None,
            current_draw: None,
        });
        self.custom_assets = CustomAssets::default();
        self.display_settings = DisplaySettings::default();
        log::info!("Session reset");
        self.commit();
    }

    /// Replace the session with restored entities. Any open draw is
    /// dropped. Returns the restore warnings.
    pub fn restore_session(&mut self, restored: RestoredSession) -> Vec<String> {
        self.roster = restored.roster;
        self.machine.reset();
        log::info!(
            "Session restored: {} participants, {} prizes, {} winners",
            self.roster.participants().len(),
            self.roster.prizes().len(),
            self.roster.winners().len()
        );
        self.commit();
        restored.warnings
    }

    /// Restore from the auto-backup slots, if a usable backup exists
    pub fn recover_from_backup(&mut self) -> Option<Vec<String>> {
        let restored = self.backup.as_ref()?.load_auto_backup()?;
        Some(self.restore_session(restored))
    }

    pub fn restore_snapshot(&mut self, name: &str) -> Option<Vec<String>> {
        let restored = self.backup.as_ref()?.load_snapshot(name)?;
        Some(self.restore_session(restored))
    }

    pub fn create_snapshot(&self) -> Option<PathBuf> {
        self.backup.as_ref()?.create_snapshot(&self.roster)
    }

    /// Adopt a full state wholesale (console mirror, crash replay). A state
    /// caught mid-draw is settled: its staged picks become pending.
    pub fn apply_snapshot(&mut self, state: &FullState) {
        self.roster = state.roster();
        self.machine.restore(state.machine());
        self.custom_assets = state.custom_assets.clone();
        self.display_settings = state.display_settings.clone();
        self.revision = self.revision.max(state.revision);
        self.commit();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // IMPORT
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace the participant list from sheet rows. A failed import leaves
    /// the session unchanged.
    pub fn import_participants(&mut self, rows: &[TabularRow]) -> ImportReport<Participant> {
        let mut report = parse_participants(rows);
        if report.outcome() == ImportOutcome::Failed {
            return report;
        }
        if !self.set_participants(report.entities.clone()) {
            refuse(
                &mut report,
                "participants cannot be replaced once winners exist or a draw is open",
            );
        }
        report
    }

    /// Replace the prize list from sheet rows
    pub fn import_prizes(&mut self, rows: &[TabularRow]) -> ImportReport<Prize> {
        let mut report = parse_prizes(rows);
        if report.outcome() == ImportOutcome::Failed {
            return report;
        }
        if !self.set_prizes(report.entities.clone()) {
            refuse(
                &mut report,
                "prizes cannot be replaced once winners exist or a draw is open",
            );
        }
        report
    }

    /// Replace the winner records from sheet rows, resolved against the
    /// current participants and prizes
    pub fn import_winners(&mut self, rows: &[TabularRow]) -> ImportReport<Winner> {
        let mut report = resolve_winners(
            &parse_winner_rows(rows),
            self.roster.participants(),
            self.roster.prizes(),
        );
        if report.outcome() == ImportOutcome::Failed {
            return report;
        }
        if !self.draw_idle() {
            refuse(&mut report, "winners cannot be imported while a draw is open");
            return report;
        }

        self.roster = Roster::from_parts(
            self.roster.participants().to_vec(),
            self.roster.prizes().to_vec(),
            report.entities.clone(),
        );
        log::info!("Imported {} winner(s)", report.entities.len());
        self.commit();
        report
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn refuse<T>(report: &mut ImportReport<T>, reason: &str) {
    log::warn!("Import refused: {}", reason);
    report.skipped_rows = report.total_rows;
    report.entities.clear();
    report.warnings.push(reason.to_string());
}

// ============ Shared Handle ============

/// Cloneable handle to one session, shared by console and display threads
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionStore>>,
}

impl SharedSession {
    pub fn new(store: SessionStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the store
    pub fn with<R>(&self, f: impl FnOnce(&mut SessionStore) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn full_state(&self) -> FullState {
        self.inner.lock().full_state()
    }
}
