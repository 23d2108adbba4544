//! Participants

use serde::{Deserialize, Serialize};

use crate::ParticipantId;

/// A person in the draw pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub department: String,
    pub title: String,
    /// True iff at least one live winner record references this participant
    pub has_won: bool,
}

impl Participant {
    /// Create a participant with a fresh id. Returns `None` for a blank name.
    pub fn new(name: &str, department: &str, title: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: ParticipantId::generate(),
            name: name.to_string(),
            department: department.trim().to_string(),
            title: title.trim().to_string(),
            has_won: false,
        })
    }

    /// "Department - Name" label used by the confirmation list
    pub fn label(&self) -> String {
        if self.department.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.department, self.name)
        }
    }
}

/// Field-level update for a participant. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantUpdate {
    pub name: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
}

impl ParticipantUpdate {
    /// Apply to a participant. A blank name is ignored.
    pub fn apply(&self, participant: &mut Participant) {
        if let Some(name) = &self.name {
            let name = name.trim();
            if !name.is_empty() {
                participant.name = name.to_string();
            }
        }
        if let Some(department) = &self.department {
            participant.department = department.trim().to_string();
        }
        if let Some(title) = &self.title {
            participant.title = title.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        assert!(Participant::new("   ", "Sales", "Rep").is_none());
        let p = Participant::new(" Ada ", " R&D ", "Engineer").unwrap();
        assert_eq!(p.name, "Ada");
        assert_eq!(p.department, "R&D");
        assert!(!p.has_won);
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let mut p = Participant::new("Ada", "R&D", "Engineer").unwrap();
        ParticipantUpdate {
            title: Some("Lead".into()),
            name: Some("  ".into()),
            ..Default::default()
        }
        .apply(&mut p);
        assert_eq!(p.name, "Ada");
        assert_eq!(p.title, "Lead");
        assert_eq!(p.label(), "R&D - Ada");
    }
}
