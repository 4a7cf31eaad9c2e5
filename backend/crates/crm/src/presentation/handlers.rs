//! HTTP Handlers

use std::net::SocketAddr;
use std::sync::Arc;

use auth::CurrentUser;
use axum::Json;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use kernel::id::RegistrationId;
use kernel::page::{Page, PageRequest};
use platform::client::extract_client_ip;
use platform::rate_limit::RateLimitStore;
use uuid::Uuid;

use crate::application::config::CrmConfig;
use crate::application::{IntakeUseCase, PipelineUseCase};
use crate::domain::entities::RegistrationStatus;
use crate::domain::repository::{CrmStore, RegistrationFilter};
use crate::error::{CrmError, CrmResult};
use crate::presentation::dto::{
    NoteRequest, NoteResponse, RegistrationDetailResponse, RegistrationQuery,
    RegistrationReceipt, RegistrationRequest, RegistrationResponse, StatsResponse, StatusRequest,
};

/// Public intake state
pub struct IntakeAppState<S, L>
where
    S: CrmStore,
    L: RateLimitStore + Send + Sync + 'static,
{
    pub store: Arc<S>,
    pub limiter: Arc<L>,
    pub config: Arc<CrmConfig>,
}

impl<S, L> Clone for IntakeAppState<S, L>
where
    S: CrmStore,
    L: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            limiter: self.limiter.clone(),
            config: self.config.clone(),
        }
    }
}

/// Admin pipeline state
pub struct CrmAppState<S>
where
    S: CrmStore,
{
    pub store: Arc<S>,
}

impl<S> Clone for CrmAppState<S>
where
    S: CrmStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

// ============================================================================
// Intake
// ============================================================================

/// POST /api/registrations
pub async fn submit<S, L>(
    State(state): State<IntakeAppState<S, L>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<RegistrationRequest>,
) -> CrmResult<(StatusCode, Json<RegistrationReceipt>)>
where
    S: CrmStore,
    L: RateLimitStore + Send + Sync + 'static,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip())).map(|ip| ip.to_string());

    let registration = IntakeUseCase::new(
        state.store.clone(),
        state.limiter.clone(),
        state.config.clone(),
    )
    .submit(req.into(), client_ip)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationReceipt::from(&registration)),
    ))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/crm/registrations
pub async fn list_registrations<S: CrmStore>(
    State(state): State<CrmAppState<S>>,
    Query(query): Query<RegistrationQuery>,
    Query(page): Query<PageRequest>,
) -> CrmResult<Json<Page<RegistrationResponse>>> {
    let status = query
        .status
        .as_deref()
        .filter(|code| !code.is_empty())
        .map(|code| {
            RegistrationStatus::from_code(code)
                .ok_or_else(|| CrmError::Validation(format!("Unknown status '{code}'")))
        })
        .transpose()?;

    let filter = RegistrationFilter {
        status,
        search: query.q,
    };
    let registrations = PipelineUseCase::new(state.store.clone())
        .list(filter, page)
        .await?;
    Ok(Json(registrations.map(Into::into)))
}

/// GET /api/crm/registrations/{id}
pub async fn get_registration<S: CrmStore>(
    State(state): State<CrmAppState<S>>,
    Path(id): Path<Uuid>,
) -> CrmResult<Json<RegistrationDetailResponse>> {
    let detail = PipelineUseCase::new(state.store.clone())
        .detail(RegistrationId::from_uuid(id))
        .await?;
    Ok(Json(detail.into()))
}

/// POST /api/crm/registrations/{id}/status
pub async fn change_status<S: CrmStore>(
    State(state): State<CrmAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> CrmResult<Json<RegistrationDetailResponse>> {
    let detail = PipelineUseCase::new(state.store.clone())
        .change_status(
            user.user_id,
            RegistrationId::from_uuid(id),
            req.status,
            req.comment.as_deref(),
        )
        .await?;
    Ok(Json(detail.into()))
}

/// POST /api/crm/registrations/{id}/notes
pub async fn add_note<S: CrmStore>(
    State(state): State<CrmAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> CrmResult<(StatusCode, Json<NoteResponse>)> {
    let note = PipelineUseCase::new(state.store.clone())
        .add_note(user.user_id, RegistrationId::from_uuid(id), &req.body)
        .await?;

    let mut response = NoteResponse::from(note);
    response.author_name = Some(user.user_name);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/crm/stats
pub async fn stats<S: CrmStore>(
    State(state): State<CrmAppState<S>>,
) -> CrmResult<Json<StatsResponse>> {
    let stats = PipelineUseCase::new(state.store.clone()).stats().await?;
    Ok(Json(stats.into()))
}
