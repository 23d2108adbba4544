//! Backup manager
//!
//! Keeps the current session recoverable:
//! - Reserved auto-backup slots, overwritten after every mutation
//! - Timestamped user snapshots
//! - Crash recovery from the reserved slots
//! - Display settings payload

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pd_core::{CustomAssets, CustomAssetsPatch, DisplaySettings, DisplaySettingsPatch, Roster};

use crate::{
    BackupError, BackupResult, BackupStore, BackupWorkbook, ParticipantRow, PrizeRow,
    RestoredSession, WinnerRow, decode_sheet, encode_sheet, restore_sheets,
};

/// Combined session backup
pub const BACKUP_STATE: &str = "backup_state";
/// Participants sheet of the current session
pub const BACKUP_PARTICIPANTS: &str = "backup_participants";
/// Prizes sheet of the current session
pub const BACKUP_PRIZES: &str = "backup_prizes";
/// Winners sheet of the current session
pub const BACKUP_WINNERS: &str = "backup_winners";
/// Display customisation payload
pub const DISPLAY_SETTINGS_FILE: &str = "display_settings.json";

const SNAPSHOT_PREFIX: &str = "backup_";
const RESERVED: [&str; 4] = [BACKUP_STATE, BACKUP_PARTICIPANTS, BACKUP_PRIZES, BACKUP_WINNERS];

// ============ Display Settings Payload ============

/// Persisted display customisation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettingsPayload {
    pub version: u32,
    pub custom_assets: CustomAssets,
    pub display_settings: DisplaySettings,
}

impl DisplaySettingsPayload {
    pub fn new(custom_assets: CustomAssets, display_settings: DisplaySettings) -> Self {
        Self {
            version: 1,
            custom_assets,
            display_settings,
        }
    }
}

/// Lenient view of a stored payload; every part may be missing
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialPayload {
    custom_assets: CustomAssetsPatch,
    display_settings: DisplaySettingsPatch,
}

// ============ Manager ============

/// Backup operations on top of a `BackupStore`
#[derive(Clone)]
pub struct BackupManager {
    store: Arc<dyn BackupStore>,
}

impl BackupManager {
    pub fn new(store: Arc<dyn BackupStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BackupStore> {
        &self.store
    }

    /// Overwrite the reserved slots with the current session. Returns
    /// whether every slot was written.
    pub fn save_auto_backup(&self, roster: &Roster) -> bool {
        let payloads = match encode_auto_backup(roster) {
            Ok(payloads) => payloads,
            Err(e) => {
                log::warn!("Failed to encode auto backup: {}", e);
                return false;
            }
        };

        // Every slot is attempted even after a failure
        payloads
            .iter()
            .map(|(name, bytes)| self.store.save_backup(name, bytes).is_some())
            .fold(true, |all, ok| all && ok)
    }

    /// Write a timestamped snapshot (`backup_YYYY-MM-DDTHH-MM`)
    pub fn create_snapshot(&self, roster: &Roster) -> Option<PathBuf> {
        self.create_snapshot_at(roster, Utc::now())
    }

    pub fn create_snapshot_at(&self, roster: &Roster, at: DateTime<Utc>) -> Option<PathBuf> {
        let name = snapshot_name(at);
        let bytes = match BackupWorkbook::from_roster(roster).to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to encode snapshot {}: {}", name, e);
                return None;
            }
        };
        let path = self.store.save_backup(&name, &bytes);
        if path.is_some() {
            log::info!("Snapshot created: {}", name);
        }
        path
    }

    /// A previous session left its auto-backup behind
    pub fn check_for_unfinished_session(&self) -> bool {
        self.store.check_exists(BACKUP_STATE) || self.has_separate_backup()
    }

    fn has_separate_backup(&self) -> bool {
        [BACKUP_PARTICIPANTS, BACKUP_PRIZES, BACKUP_WINNERS]
            .iter()
            .all(|name| self.store.check_exists(name))
    }

    /// Recover the session from the reserved slots. The separate sheets
    /// are preferred; they are rejected as a whole if any winner row fails
    /// to resolve. Without them the combined state slot is used.
    pub fn load_auto_backup(&self) -> Option<RestoredSession> {
        let result = if self.has_separate_backup() {
            self.load_separate_backup()
        } else {
            self.load_workbook(BACKUP_STATE)
        };
        result
            .map_err(|e| log::warn!("Failed to load auto backup: {}", e))
            .ok()
    }

    fn load_separate_backup(&self) -> BackupResult<RestoredSession> {
        let participants: Vec<ParticipantRow> = decode_sheet(&self.read(BACKUP_PARTICIPANTS)?)?;
        let prizes: Vec<PrizeRow> = decode_sheet(&self.read(BACKUP_PRIZES)?)?;
        let winners: Vec<WinnerRow> = decode_sheet(&self.read(BACKUP_WINNERS)?)?;

        let restored = restore_sheets(participants, prizes, &winners);
        if !restored.is_clean() {
            log::error!("Backup winners mismatch: {}", restored.warnings.join(" | "));
            return Err(BackupError::UnresolvedWinners(restored.warnings.len()));
        }
        Ok(restored)
    }

    fn load_workbook(&self, name: &str) -> BackupResult<RestoredSession> {
        let bytes = self.read(name)?;
        Ok(BackupWorkbook::from_bytes(&bytes)?.restore())
    }

    fn read(&self, name: &str) -> BackupResult<Vec<u8>> {
        self.store
            .load_backup(name)
            .ok_or_else(|| BackupError::NotFound(name.to_string()))
    }

    /// Restore a user snapshot
    pub fn load_snapshot(&self, name: &str) -> Option<RestoredSession> {
        self.load_workbook(name)
            .map_err(|e| log::warn!("Failed to load snapshot {}: {}", name, e))
            .ok()
    }

    /// User snapshots, oldest first. Reserved slots are not listed.
    pub fn list_snapshots(&self) -> Vec<String> {
        self.store
            .list_backups()
            .into_iter()
            .filter(|name| name.starts_with(SNAPSHOT_PREFIX) && !RESERVED.contains(&name.as_str()))
            .collect()
    }

    pub fn delete_snapshot(&self, name: &str) -> bool {
        if RESERVED.contains(&name) {
            log::warn!("Refusing to delete reserved backup slot {}", name);
            return false;
        }
        self.store.delete_backup(name)
    }

    /// Drop the reserved slots once the event ended normally. Returns
    /// whether anything was removed.
    pub fn clear_auto_backup(&self) -> bool {
        RESERVED
            .iter()
            .map(|name| self.store.delete_backup(name))
            .fold(false, |any, deleted| any || deleted)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DISPLAY SETTINGS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn save_display_settings(&self, payload: &DisplaySettingsPayload) -> bool {
        match serde_json::to_vec(payload) {
            Ok(bytes) => self.store.save_backup(DISPLAY_SETTINGS_FILE, &bytes).is_some(),
            Err(e) => {
                log::warn!("Failed to encode display settings: {}", e);
                false
            }
        }
    }

    /// Load the display payload. Missing fields fall back to defaults; a
    /// payload that is not a JSON object yields all defaults.
    pub fn load_display_settings(&self) -> Option<DisplaySettingsPayload> {
        let bytes = self.store.load_backup(DISPLAY_SETTINGS_FILE)?;
        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to parse display settings: {}", e);
                return None;
            }
        };
        let partial: PartialPayload = if value.is_object() {
            serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Malformed display settings, using defaults: {}", e);
                PartialPayload::default()
            })
        } else {
            PartialPayload::default()
        };
        Some(DisplaySettingsPayload::new(
            CustomAssets::default().merged(&partial.custom_assets),
            DisplaySettings::default().merged(&partial.display_settings),
        ))
    }

    pub fn clear_display_settings(&self) -> bool {
        self.store.delete_backup(DISPLAY_SETTINGS_FILE)
    }
}

impl std::fmt::Debug for BackupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupManager").finish_non_exhaustive()
    }
}

fn encode_auto_backup(roster: &Roster) -> BackupResult<Vec<(&'static str, Vec<u8>)>> {
    let workbook = BackupWorkbook::from_roster(roster);
    Ok(vec![
        (BACKUP_STATE, workbook.to_bytes()?),
        (BACKUP_PARTICIPANTS, encode_sheet(&workbook.all_participants)?),
        (BACKUP_PRIZES, encode_sheet(&workbook.prizes)?),
        (BACKUP_WINNERS, encode_sheet(&workbook.winners)?),
    ])
}

/// `backup_` plus the UTC minute, colons replaced by dashes
pub fn snapshot_name(at: DateTime<Utc>) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, at.format("%Y-%m-%dT%H-%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackupStore;
    use chrono::TimeZone;

    fn manager() -> (BackupManager, Arc<MemoryBackupStore>) {
        let store = Arc::new(MemoryBackupStore::new());
        (BackupManager::new(store.clone()), store)
    }

    fn roster() -> Roster {
        let mut roster = Roster::new();
        let ada = roster.add_participant("Ada", "R&D", "Engineer").unwrap();
        roster.add_participant("Grace", "Ops", "Lead").unwrap();
        let prize = roster.add_prize("Laptop", 2, true).unwrap();
        roster.record_winner(&ada, &prize, Utc::now()).unwrap();
        roster
    }

    #[test]
    fn test_snapshot_name() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(snapshot_name(at), "backup_2026-03-14T15-09");
    }

    #[test]
    fn test_auto_backup_round_trip() {
        let (manager, store) = manager();
        assert!(!manager.check_for_unfinished_session());

        let roster = roster();
        assert!(manager.save_auto_backup(&roster));
        assert_eq!(store.len(), 4);
        assert!(manager.check_for_unfinished_session());

        let restored = manager.load_auto_backup().unwrap();
        assert!(restored.is_clean());
        assert_eq!(restored.roster.participants(), roster.participants());
        assert_eq!(restored.roster.winners().len(), 1);
        assert_eq!(restored.roster.prizes()[0].drawn_count, 1);
    }

    #[test]
    fn test_separate_backup_rejected_on_mismatch() {
        let (manager, store) = manager();
        let roster = roster();
        manager.save_auto_backup(&roster);

        // Winners sheet points at a participant the sheet does not know
        let mut winners: Vec<WinnerRow> = roster.winners().iter().map(WinnerRow::from).collect();
        winners[0].participant_id = None;
        winners[0].participant_name = "Stranger".to_string();
        store.save_backup(BACKUP_WINNERS, &encode_sheet(&winners).unwrap());

        assert!(manager.load_auto_backup().is_none());
    }

    #[test]
    fn test_falls_back_to_state_slot() {
        let (manager, store) = manager();
        manager.save_auto_backup(&roster());
        store.delete_backup(BACKUP_PRIZES);

        assert!(manager.check_for_unfinished_session());
        let restored = manager.load_auto_backup().unwrap();
        assert_eq!(restored.roster.winners().len(), 1);
    }

    #[test]
    fn test_snapshots_listing_and_delete() {
        let (manager, _store) = manager();
        let roster = roster();
        manager.save_auto_backup(&roster);
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 0).unwrap();
        manager.create_snapshot_at(&roster, at).unwrap();
        manager.save_display_settings(&DisplaySettingsPayload::new(
            CustomAssets::default(),
            DisplaySettings::default(),
        ));

        assert_eq!(manager.list_snapshots(), vec!["backup_2026-03-14T15-09"]);
        let restored = manager.load_snapshot("backup_2026-03-14T15-09").unwrap();
        assert_eq!(restored.roster.winners().len(), 1);
        assert!(manager.load_snapshot("backup_missing").is_none());

        assert!(!manager.delete_snapshot(BACKUP_STATE));
        assert!(manager.delete_snapshot("backup_2026-03-14T15-09"));
        assert!(manager.list_snapshots().is_empty());
    }

    #[test]
    fn test_clear_auto_backup() {
        let (manager, store) = manager();
        assert!(!manager.clear_auto_backup());
        manager.save_auto_backup(&roster());
        assert!(manager.clear_auto_backup());
        assert!(store.is_empty());
        assert!(!manager.check_for_unfinished_session());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let (manager, store) = manager();
        store.set_failing(true);
        assert!(!manager.save_auto_backup(&roster()));
        assert!(manager.create_snapshot(&roster()).is_none());
    }

    #[test]
    fn test_display_settings_normalized() {
        let (manager, store) = manager();
        assert!(manager.load_display_settings().is_none());

        store.save_backup(
            DISPLAY_SETTINGS_FILE,
            br#"{"version":1,"custom_assets":{"logo":"data:image/png;base64,AAA"},"display_settings":{"standby":{"title":"Gala"}}}"#,
        );
        let payload = manager.load_display_settings().unwrap();
        assert_eq!(payload.custom_assets.logo.as_deref(), Some("data:image/png;base64,AAA"));
        assert_eq!(payload.display_settings.standby.title, "Gala");
        assert_eq!(
            payload.display_settings.countdown,
            DisplaySettings::default().countdown
        );

        store.save_backup(DISPLAY_SETTINGS_FILE, b"42");
        let payload = manager.load_display_settings().unwrap();
        assert_eq!(payload.display_settings, DisplaySettings::default());

        assert!(manager.clear_display_settings());
        assert!(manager.load_display_settings().is_none());
    }
}
