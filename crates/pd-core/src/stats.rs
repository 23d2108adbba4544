//! Session statistics

use serde::{Deserialize, Serialize};

use crate::{Participant, Prize, PrizeStatus};

/// Derived counters shown on the dashboard
///
/// Recomputed from the entities after every mutation, never edited directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_participants: usize,
    pub remaining_participants: usize,
    pub completed_prizes: usize,
    pub total_prizes: usize,
}

impl Statistics {
    pub fn compute(participants: &[Participant], prizes: &[Prize]) -> Self {
        Self {
            total_participants: participants.len(),
            remaining_participants: participants.iter().filter(|p| !p.has_won).count(),
            completed_prizes: prizes
                .iter()
                .filter(|p| p.status == PrizeStatus::Completed)
                .count(),
            total_prizes: prizes.len(),
        }
    }

    /// Share of prizes fully drawn (0.0 - 1.0)
    pub fn completion_ratio(&self) -> f64 {
        if self.total_prizes > 0 {
            self.completed_prizes as f64 / self.total_prizes as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_counts() {
        let mut ada = Participant::new("Ada", "R&D", "").unwrap();
        ada.has_won = true;
        let grace = Participant::new("Grace", "Ops", "").unwrap();

        let mut done = Prize::new("Laptop", 1, true, 0).unwrap();
        done.drawn_count = 1;
        done.refresh_status(false);
        let open = Prize::new("Mug", 2, true, 1).unwrap();

        let stats = Statistics::compute(&[ada, grace], &[done, open]);
        assert_eq!(stats.total_participants, 2);
        assert_eq!(stats.remaining_participants, 1);
        assert_eq!(stats.completed_prizes, 1);
        assert_eq!(stats.total_prizes, 2);
        assert_eq!(stats.completion_ratio(), 0.5);
    }

    #[test]
    fn test_empty_ratio() {
        assert_eq!(Statistics::default().completion_ratio(), 0.0);
    }
}
