//! Repository Traits

use chrono::{DateTime, Utc};
use kernel::id::RegistrationId;
use kernel::page::PageRequest;

use crate::domain::entities::{NoteView, Registration, RegistrationNote, RegistrationStatus};
use crate::error::CrmResult;

/// Admin list filter
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    /// Case-insensitive substring of name, email or city
    pub search: Option<String>,
}

#[trait_variant::make(RegistrationRepository: Send)]
pub trait LocalRegistrationRepository {
    /// An open registration for `email` other than `except`
    async fn has_open_registration(
        &self,
        email: &str,
        except: Option<RegistrationId>,
    ) -> CrmResult<bool>;

    /// A concurrent open duplicate is `CrmError::DuplicateRegistration`
    async fn create_registration(&self, registration: &Registration) -> CrmResult<()>;

    async fn find_registration(&self, id: RegistrationId) -> CrmResult<Option<Registration>>;

    /// Newest first
    async fn list_registrations(
        &self,
        filter: &RegistrationFilter,
        page: PageRequest,
    ) -> CrmResult<(Vec<Registration>, i64)>;

    async fn set_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
        updated_at: DateTime<Utc>,
    ) -> CrmResult<()>;

    /// Only statuses with at least one registration
    async fn count_by_status(&self) -> CrmResult<Vec<(RegistrationStatus, i64)>>;
}

#[trait_variant::make(NoteRepository: Send)]
pub trait LocalNoteRepository {
    async fn add_note(&self, note: &RegistrationNote) -> CrmResult<()>;

    /// Oldest first
    async fn list_notes(&self, registration_id: RegistrationId) -> CrmResult<Vec<NoteView>>;
}

pub trait CrmStore: RegistrationRepository + NoteRepository + Send + Sync + 'static {}

impl<T> CrmStore for T where T: RegistrationRepository + NoteRepository + Send + Sync + 'static {}
