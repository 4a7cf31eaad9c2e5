//! API DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kernel::id::{RegistrationId, RegistrationNoteId};
use serde::{Deserialize, Serialize};

use crate::application::{RegistrationDetail, RegistrationInput, RegistrationStats};
use crate::domain::entities::{NoteView, Registration, RegistrationNote, RegistrationStatus};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub consent: bool,
    #[serde(default)]
    pub source: Option<String>,
}

impl From<RegistrationRequest> for RegistrationInput {
    fn from(req: RegistrationRequest) -> Self {
        RegistrationInput {
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            city: req.city,
            interests: req.interests,
            message: req.message,
            consent: req.consent,
            source: req.source,
        }
    }
}

/// `?status=&q=` on the admin list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub status: RegistrationStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteRequest {
    pub body: String,
}

// ============================================================================
// Responses
// ============================================================================

/// What the public form gets back
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub id: RegistrationId,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Registration> for RegistrationReceipt {
    fn from(registration: &Registration) -> Self {
        Self {
            id: registration.id,
            status: registration.status,
            created_at: registration.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: RegistrationId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub interests: Vec<String>,
    pub message: String,
    pub source: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationResponse {
    fn from(r: Registration) -> Self {
        Self {
            id: r.id,
            full_name: r.full_name,
            email: r.email,
            phone: r.phone,
            city: r.city,
            interests: r.interests,
            message: r.message,
            source: r.source,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: RegistrationNoteId,
    pub body: String,
    /// `None` for system notes
    pub author_name: Option<String>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NoteView> for NoteResponse {
    fn from(view: NoteView) -> Self {
        Self {
            id: view.note.id,
            is_system: view.note.author_id.is_none(),
            body: view.note.body,
            author_name: view.author_name,
            created_at: view.note.created_at,
        }
    }
}

impl From<RegistrationNote> for NoteResponse {
    fn from(note: RegistrationNote) -> Self {
        NoteView {
            note,
            author_name: None,
        }
        .into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationDetailResponse {
    pub registration: RegistrationResponse,
    pub notes: Vec<NoteResponse>,
}

impl From<RegistrationDetail> for RegistrationDetailResponse {
    fn from(detail: RegistrationDetail) -> Self {
        Self {
            registration: detail.registration.into(),
            notes: detail.notes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub by_status: BTreeMap<&'static str, i64>,
    pub total: i64,
}

impl From<RegistrationStats> for StatsResponse {
    fn from(stats: RegistrationStats) -> Self {
        Self {
            by_status: stats.by_status,
            total: stats.total,
        }
    }
}
