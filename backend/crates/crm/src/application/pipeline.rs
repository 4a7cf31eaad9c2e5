//! Admin Pipeline
//!
//! Every status change leaves a system note on the registration so the
//! history can be read back from the notes alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use auth::UserId;
use chrono::Utc;
use kernel::id::RegistrationId;
use kernel::page::{Page, PageRequest};

use crate::domain::entities::{NoteView, Registration, RegistrationNote, RegistrationStatus};
use crate::domain::repository::{CrmStore, RegistrationFilter};
use crate::domain::value_objects::note_body;
use crate::error::{CrmError, CrmResult};

#[derive(Debug, Clone)]
pub struct RegistrationDetail {
    pub registration: Registration,
    pub notes: Vec<NoteView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationStats {
    /// Every status, zero included
    pub by_status: BTreeMap<&'static str, i64>,
    pub total: i64,
}

pub struct PipelineUseCase<S>
where
    S: CrmStore,
{
    store: Arc<S>,
}

impl<S> PipelineUseCase<S>
where
    S: CrmStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        mut filter: RegistrationFilter,
        page: PageRequest,
    ) -> CrmResult<Page<Registration>> {
        filter.search = filter
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if filter.search.as_ref().is_some_and(|s| s.chars().count() > 100) {
            return Err(CrmError::Validation(
                "Search must be at most 100 characters".to_string(),
            ));
        }

        let (items, total) = self.store.list_registrations(&filter, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn detail(&self, id: RegistrationId) -> CrmResult<RegistrationDetail> {
        let registration = self.find(id).await?;
        let notes = self.store.list_notes(id).await?;
        Ok(RegistrationDetail {
            registration,
            notes,
        })
    }

    pub async fn change_status(
        &self,
        admin: UserId,
        id: RegistrationId,
        status: RegistrationStatus,
        comment: Option<&str>,
    ) -> CrmResult<RegistrationDetail> {
        let mut registration = self.find(id).await?;
        let from = registration.status;
        if !from.can_transition_to(status) {
            return Err(CrmError::InvalidTransition { from, to: status });
        }

        // Reopening must not create a second open application
        if !from.is_open()
            && status.is_open()
            && self
                .store
                .has_open_registration(&registration.email, Some(id))
                .await?
        {
            return Err(CrmError::DuplicateRegistration);
        }

        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(note_body)
            .transpose()?;

        let now = Utc::now();
        self.store.set_status(id, status, now).await?;
        registration.status = status;
        registration.updated_at = now;

        let mut body = format!("Status changed from '{from}' to '{status}'");
        if let Some(comment) = comment {
            body.push_str(": ");
            body.push_str(&comment);
        }
        self.store
            .add_note(&RegistrationNote::new(id, None, body))
            .await?;

        tracing::info!(
            registration_id = %id,
            admin = %admin,
            from = %from,
            to = %status,
            "Registration status changed"
        );

        let notes = self.store.list_notes(id).await?;
        Ok(RegistrationDetail {
            registration,
            notes,
        })
    }

    pub async fn add_note(
        &self,
        admin: UserId,
        id: RegistrationId,
        body: &str,
    ) -> CrmResult<RegistrationNote> {
        let body = note_body(body)?;
        self.find(id).await?;

        let note = RegistrationNote::new(id, Some(admin), body);
        self.store.add_note(&note).await?;

        tracing::info!(registration_id = %id, admin = %admin, "Registration note added");
        Ok(note)
    }

    pub async fn stats(&self) -> CrmResult<RegistrationStats> {
        let mut by_status: BTreeMap<&'static str, i64> = RegistrationStatus::ALL
            .iter()
            .map(|s| (s.code(), 0))
            .collect();
        for (status, count) in self.store.count_by_status().await? {
            by_status.insert(status.code(), count);
        }
        let total = by_status.values().sum();
        Ok(RegistrationStats { by_status, total })
    }

    async fn find(&self, id: RegistrationId) -> CrmResult<Registration> {
        self.store
            .find_registration(id)
            .await?
            .ok_or(CrmError::NotFound("Registration"))
    }
}
