//! HTTP Handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use auth::CurrentUser;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::CmsPostId;
use kernel::page::{Page, PageRequest};
use uuid::Uuid;

use crate::application::{LandingUseCase, NewsUseCase};
use crate::domain::entities::PostStatus;
use crate::domain::repository::CmsStore;
use crate::error::{CmsError, CmsResult};
use crate::presentation::dto::{
    CreateNewsRequest, LandingBlockRequest, LandingBlockResponse, NewsResponse,
    NewsSummaryResponse, StatusFilter, UpdateNewsRequest,
};

pub struct CmsAppState<S>
where
    S: CmsStore,
{
    pub store: Arc<S>,
}

impl<S> Clone for CmsAppState<S>
where
    S: CmsStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

// ============================================================================
// Public
// ============================================================================

/// GET /api/cms/landing
pub async fn landing<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
) -> CmsResult<Json<BTreeMap<String, serde_json::Value>>> {
    let blocks = LandingUseCase::new(state.store.clone())
        .public_blocks()
        .await?;
    Ok(Json(blocks))
}

/// GET /api/cms/posts
pub async fn list_published<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Query(page): Query<PageRequest>,
) -> CmsResult<Json<Page<NewsSummaryResponse>>> {
    let posts = NewsUseCase::new(state.store.clone())
        .list_published(page)
        .await?;
    Ok(Json(posts.map(Into::into)))
}

/// GET /api/cms/posts/{slug}
pub async fn get_published<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Path(slug): Path<String>,
) -> CmsResult<Json<NewsResponse>> {
    let post = NewsUseCase::new(state.store.clone())
        .get_published(&slug)
        .await?;
    Ok(Json(post.into()))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/cms/admin/landing
pub async fn admin_landing<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
) -> CmsResult<Json<Vec<LandingBlockResponse>>> {
    let blocks = LandingUseCase::new(state.store.clone()).all_blocks().await?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

/// PUT /api/cms/admin/landing/{key}
pub async fn put_landing_block<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    user: CurrentUser,
    Path(key): Path<String>,
    Json(req): Json<LandingBlockRequest>,
) -> CmsResult<Json<LandingBlockResponse>> {
    let block = LandingUseCase::new(state.store.clone())
        .put_block(user.user_id, &key, req.content, req.is_published)
        .await?;
    Ok(Json(block.into()))
}

/// GET /api/cms/admin/posts
pub async fn admin_list<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Query(filter): Query<StatusFilter>,
    Query(page): Query<PageRequest>,
) -> CmsResult<Json<Page<NewsSummaryResponse>>> {
    let status = filter
        .status
        .as_deref()
        .map(|code| {
            PostStatus::from_code(code)
                .ok_or_else(|| CmsError::Validation(format!("Unknown status '{code}'")))
        })
        .transpose()?;

    let posts = NewsUseCase::new(state.store.clone())
        .list_all(status, page)
        .await?;
    Ok(Json(posts.map(Into::into)))
}

/// GET /api/cms/admin/posts/{id}
pub async fn admin_get<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Path(id): Path<Uuid>,
) -> CmsResult<Json<NewsResponse>> {
    let post = NewsUseCase::new(state.store.clone())
        .get(CmsPostId::from_uuid(id))
        .await?;
    Ok(Json(post.into()))
}

/// POST /api/cms/admin/posts
pub async fn create_post<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    user: CurrentUser,
    Json(req): Json<CreateNewsRequest>,
) -> CmsResult<(StatusCode, Json<NewsResponse>)> {
    let post = NewsUseCase::new(state.store.clone())
        .create(user.user_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

/// PATCH /api/cms/admin/posts/{id}
pub async fn update_post<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNewsRequest>,
) -> CmsResult<Json<NewsResponse>> {
    let post = NewsUseCase::new(state.store.clone())
        .update(CmsPostId::from_uuid(id), req.into())
        .await?;
    Ok(Json(post.into()))
}

/// POST /api/cms/admin/posts/{id}/publish
pub async fn publish_post<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Path(id): Path<Uuid>,
) -> CmsResult<Json<NewsResponse>> {
    let post = NewsUseCase::new(state.store.clone())
        .publish(CmsPostId::from_uuid(id))
        .await?;
    Ok(Json(post.into()))
}

/// POST /api/cms/admin/posts/{id}/unpublish
pub async fn unpublish_post<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Path(id): Path<Uuid>,
) -> CmsResult<Json<NewsResponse>> {
    let post = NewsUseCase::new(state.store.clone())
        .unpublish(CmsPostId::from_uuid(id))
        .await?;
    Ok(Json(post.into()))
}

/// DELETE /api/cms/admin/posts/{id}
pub async fn delete_post<S: CmsStore>(
    State(state): State<CmsAppState<S>>,
    Path(id): Path<Uuid>,
) -> CmsResult<StatusCode> {
    NewsUseCase::new(state.store.clone())
        .delete(CmsPostId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
