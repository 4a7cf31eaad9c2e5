//! Domain Entities

use std::fmt;

use auth::UserId;
use chrono::{DateTime, Utc};
use kernel::id::{RegistrationId, RegistrationNoteId};
use serde::{Deserialize, Serialize};

/// Where an application is in the intake pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    New,
    Contacted,
    Approved,
    Rejected,
    Archived,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 5] = [
        RegistrationStatus::New,
        RegistrationStatus::Contacted,
        RegistrationStatus::Approved,
        RegistrationStatus::Rejected,
        RegistrationStatus::Archived,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            RegistrationStatus::New => "new",
            RegistrationStatus::Contacted => "contacted",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
            RegistrationStatus::Archived => "archived",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Still waiting for a decision; at most one per email
    pub const fn is_open(&self) -> bool {
        matches!(self, RegistrationStatus::New | RegistrationStatus::Contacted)
    }

    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        matches!(
            (self, next),
            (New, Contacted | Approved | Rejected)
                | (Contacted, Approved | Rejected)
                | (Approved | Rejected, Archived)
                | (Rejected, New)
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub id: RegistrationId,
    pub full_name: String,
    /// Lowercased
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub interests: Vec<String>,
    pub message: String,
    pub source: Option<String>,
    pub status: RegistrationStatus,
    pub client_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RegistrationNote {
    pub id: RegistrationNoteId,
    pub registration_id: RegistrationId,
    /// `None` for notes written by the system
    pub author_id: Option<UserId>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl RegistrationNote {
    pub fn new(registration_id: RegistrationId, author_id: Option<UserId>, body: String) -> Self {
        Self {
            id: RegistrationNoteId::new(),
            registration_id,
            author_id,
            body,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteView {
    pub note: RegistrationNote,
    pub author_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RegistrationStatus::*;

    #[test]
    fn test_codes_round_trip() {
        for status in RegistrationStatus::ALL {
            assert_eq!(RegistrationStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(RegistrationStatus::from_code("pending"), None);
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(New.can_transition_to(Contacted));
        assert!(New.can_transition_to(Approved));
        assert!(New.can_transition_to(Rejected));
        assert!(Contacted.can_transition_to(Approved));
        assert!(Contacted.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Archived));
        assert!(Rejected.can_transition_to(Archived));
        assert!(Rejected.can_transition_to(New));
    }

    #[test]
    fn test_forbidden_transitions() {
        assert!(!New.can_transition_to(Archived));
        assert!(!New.can_transition_to(New));
        assert!(!Contacted.can_transition_to(New));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(New));
        for status in RegistrationStatus::ALL {
            assert!(!Archived.can_transition_to(status));
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(New.is_open());
        assert!(Contacted.is_open());
        assert!(!Rejected.is_open());
    }
}
