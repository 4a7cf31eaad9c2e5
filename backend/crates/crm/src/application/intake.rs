//! Registration Intake

use std::sync::Arc;

use chrono::Utc;
use kernel::id::RegistrationId;
use platform::rate_limit::RateLimitStore;

use crate::application::config::CrmConfig;
use crate::domain::entities::{Registration, RegistrationStatus};
use crate::domain::repository::CrmStore;
use crate::domain::value_objects;
use crate::error::{CrmError, CrmResult};

#[derive(Debug, Clone, Default)]
pub struct RegistrationInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub interests: Vec<String>,
    pub message: Option<String>,
    pub consent: bool,
    pub source: Option<String>,
}

pub struct IntakeUseCase<S, L>
where
    S: CrmStore,
    L: RateLimitStore + Send + Sync + 'static,
{
    store: Arc<S>,
    limiter: Arc<L>,
    config: Arc<CrmConfig>,
}

impl<S, L> IntakeUseCase<S, L>
where
    S: CrmStore,
    L: RateLimitStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, limiter: Arc<L>, config: Arc<CrmConfig>) -> Self {
        Self {
            store,
            limiter,
            config,
        }
    }

    /// Validate first so a typo does not burn the caller's quota
    pub async fn submit(
        &self,
        input: RegistrationInput,
        client_ip: Option<String>,
    ) -> CrmResult<Registration> {
        if !input.consent {
            return Err(CrmError::ConsentRequired);
        }

        let now = Utc::now();
        let registration = Registration {
            id: RegistrationId::new(),
            full_name: value_objects::full_name(&input.full_name)?,
            email: value_objects::email(&input.email)?,
            phone: value_objects::phone(input.phone.as_deref())?,
            city: value_objects::city(input.city.as_deref())?,
            interests: value_objects::interests(&input.interests)?,
            message: value_objects::message(input.message.as_deref())?,
            source: value_objects::source(input.source.as_deref())?,
            status: RegistrationStatus::New,
            client_ip,
            created_at: now,
            updated_at: now,
        };

        let key = format!(
            "registration:{}",
            registration.client_ip.as_deref().unwrap_or("unknown")
        );
        let decision = self
            .limiter
            .check_and_increment(&key, &self.config.rate_limit())
            .await?;
        if !decision.allowed {
            return Err(CrmError::RateLimited {
                retry_after_secs: decision.retry_after_secs(now.timestamp_millis()),
            });
        }

        if self
            .store
            .has_open_registration(&registration.email, None)
            .await?
        {
            return Err(CrmError::DuplicateRegistration);
        }
        self.store.create_registration(&registration).await?;

        tracing::info!(
            registration_id = %registration.id,
            source = registration.source.as_deref().unwrap_or("-"),
            interests = registration.interests.len(),
            "Registration received"
        );
        Ok(registration)
    }
}
