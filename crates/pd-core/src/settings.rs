//! Display customisation: screen settings and media assets
//!
//! Partial updates are explicit patch structs, one per settings section.
//! Merge semantics are field-level: a `Some` field overrides, a `None` field
//! keeps the current value, sections not mentioned are left untouched.

use serde::{Deserialize, Serialize};

// ============ Custom Assets ============

/// Sound payloads used by the display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundAssets {
    pub rolling: Option<String>,
    pub winner: Option<String>,
    pub countdown: Option<String>,
}

/// Media chosen by the operator, stored as opaque base64 payloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomAssets {
    pub logo: Option<String>,
    pub background: Option<String>,
    pub sounds: SoundAssets,
}

/// Patch for [`SoundAssets`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundAssetsPatch {
    pub rolling: Option<String>,
    pub winner: Option<String>,
    pub countdown: Option<String>,
}

/// Patch for [`CustomAssets`]. An empty string clears a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomAssetsPatch {
    pub logo: Option<String>,
    pub background: Option<String>,
    pub sounds: Option<SoundAssetsPatch>,
}

fn merge_slot(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.clone())
        };
    }
}

impl CustomAssets {
    pub fn merge(&mut self, patch: &CustomAssetsPatch) {
        merge_slot(&mut self.logo, &patch.logo);
        merge_slot(&mut self.background, &patch.background);
        if let Some(sounds) = &patch.sounds {
            merge_slot(&mut self.sounds.rolling, &sounds.rolling);
            merge_slot(&mut self.sounds.winner, &sounds.winner);
            merge_slot(&mut self.sounds.countdown, &sounds.countdown);
        }
    }

    pub fn merged(mut self, patch: &CustomAssetsPatch) -> Self {
        self.merge(patch);
        self
    }
}

// ============ Display Settings ============

/// Standby screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandbySettings {
    pub title: String,
    pub subtitle: String,
    pub show_logo: bool,
    pub show_prize_preview: bool,
    pub show_prize_progress: bool,
}

impl Default for StandbySettings {
    fn default() -> Self {
        Self {
            title: "年終尾牙抽獎".to_string(),
            subtitle: "精彩好禮等你來拿！".to_string(),
            show_logo: true,
            show_prize_preview: true,
            show_prize_progress: true,
        }
    }
}

/// Reveal countdown screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownSettings {
    pub show_logo: bool,
    pub label: String,
    pub subtitle: String,
    pub show_prize_name: bool,
    pub show_prize_progress: bool,
    pub flash_duration_seconds: u32,
    pub flash_name_duration_ms: u32,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            show_logo: false,
            label: "REVEAL IN".to_string(),
            subtitle: "Prepare for the reveal".to_string(),
            show_prize_name: true,
            show_prize_progress: true,
            flash_duration_seconds: 3,
            flash_name_duration_ms: 120,
        }
    }
}

/// Winner announcement screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinnerSettings {
    pub show_logo: bool,
    pub badge_text: String,
    pub show_prize_name: bool,
    pub show_prize_progress: bool,
    pub show_confetti: bool,
    pub show_department: bool,
    pub show_trophy: bool,
    pub trophy_emoji: String,
}

impl Default for WinnerSettings {
    fn default() -> Self {
        Self {
            show_logo: false,
            badge_text: "🎉 恭喜中獎 🎉".to_string(),
            show_prize_name: true,
            show_prize_progress: true,
            show_confetti: true,
            show_department: true,
            show_trophy: true,
            trophy_emoji: "🏆".to_string(),
        }
    }
}

/// Settings for every display screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub standby: StandbySettings,
    pub countdown: CountdownSettings,
    pub winner: WinnerSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandbyPatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub show_logo: Option<bool>,
    pub show_prize_preview: Option<bool>,
    pub show_prize_progress: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownPatch {
    pub show_logo: Option<bool>,
    pub label: Option<String>,
    pub subtitle: Option<String>,
    pub show_prize_name: Option<bool>,
    pub show_prize_progress: Option<bool>,
    pub flash_duration_seconds: Option<u32>,
    pub flash_name_duration_ms: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinnerPatch {
    pub show_logo: Option<bool>,
    pub badge_text: Option<String>,
    pub show_prize_name: Option<bool>,
    pub show_prize_progress: Option<bool>,
    pub show_confetti: Option<bool>,
    pub show_department: Option<bool>,
    pub show_trophy: Option<bool>,
    pub trophy_emoji: Option<String>,
}

/// Partial update across the display sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettingsPatch {
    pub standby: Option<StandbyPatch>,
    pub countdown: Option<CountdownPatch>,
    pub winner: Option<WinnerPatch>,
}

fn set<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

impl StandbySettings {
    pub fn merge(&mut self, patch: &StandbyPatch) {
        set(&mut self.title, &patch.title);
        set(&mut self.subtitle, &patch.subtitle);
        set(&mut self.show_logo, &patch.show_logo);
        set(&mut self.show_prize_preview, &patch.show_prize_preview);
        set(&mut self.show_prize_progress, &patch.show_prize_progress);
    }
}

impl CountdownSettings {
    pub fn merge(&mut self, patch: &CountdownPatch) {
        set(&mut self.show_logo, &patch.show_logo);
        set(&mut self.label, &patch.label);
        set(&mut self.subtitle, &patch.subtitle);
        set(&mut self.show_prize_name, &patch.show_prize_name);
        set(&mut self.show_prize_progress, &patch.show_prize_progress);
        set(&mut self.flash_duration_seconds, &patch.flash_duration_seconds);
        set(&mut self.flash_name_duration_ms, &patch.flash_name_duration_ms);
    }
}

impl WinnerSettings {
    pub fn merge(&mut self, patch: &WinnerPatch) {
        set(&mut self.show_logo, &patch.show_logo);
        set(&mut self.badge_text, &patch.badge_text);
        set(&mut self.show_prize_name, &patch.show_prize_name);
        set(&mut self.show_prize_progress, &patch.show_prize_progress);
        set(&mut self.show_confetti, &patch.show_confetti);
        set(&mut self.show_department, &patch.show_department);
        set(&mut self.show_trophy, &patch.show_trophy);
        set(&mut self.trophy_emoji, &patch.trophy_emoji);
    }
}

impl DisplaySettings {
    pub fn merge(&mut self, patch: &DisplaySettingsPatch) {
        if let Some(standby) = &patch.standby {
            self.standby.merge(standby);
        }
        if let Some(countdown) = &patch.countdown {
            self.countdown.merge(countdown);
        }
        if let Some(winner) = &patch.winner {
            self.winner.merge(winner);
        }
    }

    pub fn merged(mut self, patch: &DisplaySettingsPatch) -> Self {
        self.merge(patch);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_overrides_single_field() {
        let settings = DisplaySettings::default().merged(&DisplaySettingsPatch {
            winner: Some(WinnerPatch {
                show_confetti: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        });

        assert!(!settings.winner.show_confetti);
        assert_eq!(settings.winner.trophy_emoji, "🏆");
        assert_eq!(settings.standby, StandbySettings::default());
        assert_eq!(settings.countdown, CountdownSettings::default());
    }

    #[test]
    fn test_partial_json_keeps_nested_defaults() {
        let json = r#"{"countdown":{"label":"GO"}}"#;
        let settings: DisplaySettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.countdown.label, "GO");
        assert_eq!(settings.countdown.subtitle, "Prepare for the reveal");
        assert!(settings.standby.show_logo);
    }

    #[test]
    fn test_asset_patch_sets_and_clears() {
        let mut assets = CustomAssets::default();
        assets.merge(&CustomAssetsPatch {
            logo: Some("aGVsbG8=".into()),
            sounds: Some(SoundAssetsPatch {
                winner: Some("d2lu".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(assets.logo.as_deref(), Some("aGVsbG8="));
        assert_eq!(assets.sounds.winner.as_deref(), Some("d2lu"));

        assets.merge(&CustomAssetsPatch {
            logo: Some(String::new()),
            ..Default::default()
        });
        assert!(assets.logo.is_none());
        assert_eq!(assets.sounds.winner.as_deref(), Some("d2lu"));
    }
}
