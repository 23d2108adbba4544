//! Session configuration
//!
//! Persistent settings for a draw event:
//! - Initial draw mode and custom draw count
//! - Optional RNG seed for reproducible rehearsals
//! - Auto-backup switch and backup directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pd_draw::{DrawMode, Sampler};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Draw mode of a fresh session
    pub draw_mode: DrawMode,
    /// Confirmations per manual start in custom mode
    pub custom_draw_count: u32,
    /// Fixed seed; `None` seeds from the OS
    pub rng_seed: Option<u64>,
    /// Write the reserved backup slots after every mutation
    pub auto_backup: bool,
    /// Directory of the filesystem backup store
    pub backup_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            draw_mode: DrawMode::One,
            custom_draw_count: 1,
            rng_seed: None,
            auto_backup: true,
            backup_dir: default_backup_dir(),
        }
    }
}

fn default_backup_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("prize-draw")
        .join("backups")
}

impl SessionConfig {
    /// Load config from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load config from specified path. Missing or malformed files fall
    /// back to defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config {}: {}", path.as_ref().display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save config to standard location
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(Self::default_path())
    }

    /// Save config to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("prize-draw"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("session.json")
    }

    /// Sampler honouring `rng_seed`
    pub fn sampler(&self) -> Sampler {
        match self.rng_seed {
            Some(seed) => Sampler::seeded(seed),
            None => Sampler::from_entropy(),
        }
    }
}
