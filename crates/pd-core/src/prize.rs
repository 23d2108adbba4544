//! Prizes and their derived status

use serde::{Deserialize, Serialize};

use crate::PrizeId;

/// Prize progress status
///
/// Never stored independently: always re-derived from
/// `(drawn_count, quantity, is_active)` by [`PrizeStatus::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrizeStatus {
    /// Nothing drawn yet, not active
    Pending,
    /// Currently being drawn
    InProgress,
    /// Partially drawn, not active
    Incomplete,
    /// All slots drawn
    Completed,
}

impl PrizeStatus {
    pub fn derive(drawn_count: u32, quantity: u32, is_active: bool) -> Self {
        if drawn_count >= quantity {
            Self::Completed
        } else if is_active {
            Self::InProgress
        } else if drawn_count > 0 {
            Self::Incomplete
        } else {
            Self::Pending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Incomplete => "incomplete",
            Self::Completed => "completed",
        }
    }
}

impl Default for PrizeStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A prize with a fixed number of winner slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
    pub id: PrizeId,
    pub name: String,
    /// Number of winner slots (≥ 1)
    pub quantity: u32,
    /// Confirmed winners so far (≤ quantity)
    pub drawn_count: u32,
    /// Position in the draw sequence (dense 0..N-1 across all prizes)
    pub order: usize,
    /// Only participants that have not won yet are eligible
    pub exclude_winners: bool,
    pub status: PrizeStatus,
}

impl Prize {
    /// Create a prize with a fresh id. Returns `None` for a blank name.
    pub fn new(name: &str, quantity: u32, exclude_winners: bool, order: usize) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: PrizeId::generate(),
            name: name.to_string(),
            quantity: quantity.max(1),
            drawn_count: 0,
            order,
            exclude_winners,
            status: PrizeStatus::Pending,
        })
    }

    /// Slots still open
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.drawn_count)
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.drawn_count >= self.quantity
    }

    /// Recompute `status` for the given activity flag
    pub fn refresh_status(&mut self, is_active: bool) {
        self.status = PrizeStatus::derive(self.drawn_count, self.quantity, is_active);
    }
}

/// Field-level update for a prize. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrizeUpdate {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub exclude_winners: Option<bool>,
}

impl PrizeUpdate {
    /// Apply to a prize. A blank name is ignored; quantity is clamped so it
    /// never drops below `max(1, drawn_count)`.
    pub fn apply(&self, prize: &mut Prize) {
        if let Some(name) = &self.name {
            let name = name.trim();
            if !name.is_empty() {
                prize.name = name.to_string();
            }
        }
        if let Some(quantity) = self.quantity {
            prize.quantity = quantity.max(prize.drawn_count).max(1);
        }
        if let Some(exclude) = self.exclude_winners {
            prize.exclude_winners = exclude;
        }
    }
}
