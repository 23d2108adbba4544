//! Full-state snapshots
//!
//! A `FullState` is an immutable copy of everything the display needs.
//! Snapshots are shared as `Arc<FullState>`; a newer revision always
//! replaces an older one wholesale.

use serde::{Deserialize, Serialize};

use pd_core::{
    CustomAssets, DisplaySettings, Participant, Prize, PrizeId, Roster, Statistics, Winner,
};
use pd_draw::{Draw, DrawMode, MachineSnapshot, SystemState};

/// Immutable session state at one revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullState {
    /// Monotonic, bumped by every committed mutation
    pub revision: u64,
    pub participants: Vec<Participant>,
    pub prizes: Vec<Prize>,
    pub current_prize_id: Option<PrizeId>,
    pub winners: Vec<Winner>,
    pub current_draw: Option<Draw>,
    pub draw_mode: DrawMode,
    pub custom_draw_count: u32,
    pub system_state: SystemState,
    pub statistics: Statistics,
    #[serde(default)]
    pub custom_assets: CustomAssets,
    #[serde(default)]
    pub display_settings: DisplaySettings,
}

impl FullState {
    /// Rebuild a roster from the snapshot, repairing derived fields
    pub fn roster(&self) -> Roster {
        Roster::from_parts(
            self.participants.clone(),
            self.prizes.clone(),
            self.winners.clone(),
        )
    }

    /// Draw machine part of the snapshot
    pub fn machine(&self) -> MachineSnapshot {
        MachineSnapshot {
            system_state: self.system_state,
            draw_mode: self.draw_mode,
            custom_draw_count: self.custom_draw_count,
            current_prize_id: self.current_prize_id.clone(),
            current_draw: self.current_draw.clone(),
        }
    }

    /// Prize the operator is looking at: the drawn prize, else the
    /// selected one
    pub fn active_prize(&self) -> Option<&Prize> {
        let id = self
            .current_draw
            .as_ref()
            .map(|d| &d.prize_id)
            .or(self.current_prize_id.as_ref())?;
        self.prizes.iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> FullState {
        let mut roster = Roster::new();
        roster.add_participant("Ada", "R&D", "Engineer").unwrap();
        let prize = roster.add_prize("Laptop", 2, true).unwrap();
        FullState {
            revision: 3,
            participants: roster.participants().to_vec(),
            prizes: roster.prizes().to_vec(),
            current_prize_id: Some(prize),
            winners: Vec::new(),
            current_draw: None,
            draw_mode: DrawMode::All,
            custom_draw_count: 1,
            system_state: SystemState::Standby,
            statistics: roster.statistics(),
            custom_assets: CustomAssets::default(),
            display_settings: DisplaySettings::default(),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let state = sample_state();
        let json = serde_json::to_string(&state).unwrap();
        let back: FullState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_active_prize_falls_back_to_selection() {
        let state = sample_state();
        assert_eq!(state.active_prize().unwrap().name, "Laptop");
        assert_eq!(state.machine().draw_mode, DrawMode::All);
        assert_eq!(state.roster().prizes().len(), 1);
    }
}
