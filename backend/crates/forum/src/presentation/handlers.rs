//! HTTP Handlers

use std::sync::Arc;

use auth::{CurrentUser, PublicId};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::{CategoryId, FlagId, PostId, TopicId};
use kernel::page::{Page, PageRequest};
use uuid::Uuid;

use crate::application::config::ForumConfig;
use crate::application::{
    BrowseUseCase, CategoryInput, CategoryUpdate, CategoryUseCase, FlagUseCase,
    ModerationUseCase, NewTopicInput, PostingUseCase, TopicSwitch, VoteUseCase,
};
use crate::domain::entities::Actor;
use crate::domain::repository::ForumStore;
use crate::domain::role_tier::ROLE_TIERS;
use crate::error::{ForumError, ForumResult};
use crate::presentation::dto::{
    BanRequest, CategoryRequest, CategoryResponse, CategoryUpdateRequest,
    CreateTopicRequest, FlagQueueItem, FlagRequest, FlagResponse, MemberResponse,
    ModerationEntryResponse, PostBodyRequest, PostResponse, ReasonRequest, RoleRequest,
    StandingResponse, TierResponse, TopicDetailResponse, TopicListResponse, TopicResponse,
    VoteRequest, VoteResponse, WarnRequest,
};

pub struct ForumAppState<S>
where
    S: ForumStore,
{
    pub store: Arc<S>,
    pub config: Arc<ForumConfig>,
}

impl<S> Clone for ForumAppState<S>
where
    S: ForumStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl From<&CurrentUser> for Actor {
    fn from(user: &CurrentUser) -> Self {
        Actor {
            user_id: user.user_id,
            role: user.role,
        }
    }
}

fn parse_public_id(value: &str) -> ForumResult<PublicId> {
    PublicId::parse_str(value).map_err(|e| ForumError::Validation(e.message().to_string()))
}

fn reason_of(body: Option<Json<ReasonRequest>>) -> Option<String> {
    body.and_then(|Json(req)| req.reason)
}

// ============================================================================
// Public
// ============================================================================

/// GET /api/forum/tiers
pub async fn tiers() -> Json<Vec<TierResponse>> {
    Json(ROLE_TIERS.iter().map(TierResponse::from).collect())
}

/// GET /api/forum/categories
pub async fn list_categories<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
) -> ForumResult<Json<Vec<CategoryResponse>>> {
    let categories = BrowseUseCase::new(state.store.clone()).categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// GET /api/forum/categories/{slug}/topics
pub async fn list_topics<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    Path(slug): Path<String>,
    Query(page): Query<PageRequest>,
) -> ForumResult<Json<TopicListResponse>> {
    let (category, topics) = BrowseUseCase::new(state.store.clone())
        .topics(&slug, page)
        .await?;

    Ok(Json(TopicListResponse {
        category: category.into(),
        topics: topics.map(Into::into),
    }))
}

/// GET /api/forum/topics/{id}
pub async fn get_topic<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    Path(id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> ForumResult<Json<TopicDetailResponse>> {
    let detail = BrowseUseCase::new(state.store.clone())
        .topic(TopicId::from_uuid(id), page)
        .await?;

    Ok(Json(TopicDetailResponse {
        topic: detail.topic.into(),
        category: detail.category.into(),
        posts: detail.posts.map(Into::into),
    }))
}

/// GET /api/forum/members/{public_id}
pub async fn get_member<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    Path(public_id): Path<String>,
) -> ForumResult<Json<MemberResponse>> {
    let public_id = parse_public_id(&public_id)?;
    let member = BrowseUseCase::new(state.store.clone())
        .member(&public_id)
        .await?;
    Ok(Json(MemberResponse::from(&member)))
}

// ============================================================================
// Members
// ============================================================================

/// POST /api/forum/topics
pub async fn create_topic<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Json(req): Json<CreateTopicRequest>,
) -> ForumResult<(StatusCode, Json<TopicResponse>)> {
    let topic = PostingUseCase::new(state.store.clone())
        .create_topic(
            &Actor::from(&user),
            NewTopicInput {
                category_id: CategoryId::from_uuid(req.category_id),
                title: req.title,
                body: req.body,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(topic.into())))
}

/// POST /api/forum/topics/{id}/posts
pub async fn reply<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PostBodyRequest>,
) -> ForumResult<(StatusCode, Json<PostResponse>)> {
    let post = PostingUseCase::new(state.store.clone())
        .reply(&Actor::from(&user), TopicId::from_uuid(id), &req.body)
        .await?;

    Ok((StatusCode::CREATED, Json(post.into())))
}

/// PATCH /api/forum/posts/{id}
pub async fn edit_post<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PostBodyRequest>,
) -> ForumResult<Json<PostResponse>> {
    let post = PostingUseCase::new(state.store.clone())
        .edit_post(&Actor::from(&user), PostId::from_uuid(id), &req.body)
        .await?;

    Ok(Json(post.into()))
}

/// DELETE /api/forum/posts/{id}
pub async fn delete_post<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ForumResult<StatusCode> {
    PostingUseCase::new(state.store.clone())
        .delete_post(&Actor::from(&user), PostId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/forum/posts/{id}/vote
pub async fn vote<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> ForumResult<Json<VoteResponse>> {
    let outcome = VoteUseCase::new(state.store.clone())
        .execute(&Actor::from(&user), PostId::from_uuid(id), req.value)
        .await?;

    Ok(Json(VoteResponse {
        score: outcome.score,
        value: outcome.value,
    }))
}

/// POST /api/forum/posts/{id}/flag
pub async fn flag<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<FlagRequest>,
) -> ForumResult<(StatusCode, Json<FlagResponse>)> {
    let outcome = FlagUseCase::new(state.store.clone(), state.config.clone())
        .execute(&Actor::from(&user), PostId::from_uuid(id), &req.reason)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FlagResponse {
            flag_id: outcome.flag.id,
            open_flags: outcome.open_flags,
            auto_hidden: outcome.auto_hidden,
        }),
    ))
}

/// POST /api/forum/topics/{id}/close
pub async fn close_topic<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ForumResult<Json<TopicResponse>> {
    let topic = PostingUseCase::new(state.store.clone())
        .close_topic(&Actor::from(&user), TopicId::from_uuid(id))
        .await?;

    Ok(Json(topic.into()))
}

/// GET /api/forum/me/standing
pub async fn my_standing<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
) -> ForumResult<Json<StandingResponse>> {
    let report = BrowseUseCase::new(state.store.clone())
        .standing(&Actor::from(&user))
        .await?;

    Ok(Json(report.into()))
}

// ============================================================================
// Moderators
// ============================================================================

fn moderation<S: ForumStore>(state: &ForumAppState<S>) -> ModerationUseCase<S> {
    ModerationUseCase::new(state.store.clone(), state.config.clone())
}

/// GET /api/forum/mod/flags
pub async fn list_flags<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Query(page): Query<PageRequest>,
) -> ForumResult<Json<Page<FlagQueueItem>>> {
    let flags = moderation(&state)
        .list_flags(&Actor::from(&user), page)
        .await?;
    Ok(Json(flags.map(Into::into)))
}

/// POST /api/forum/mod/flags/{id}/dismiss
pub async fn dismiss_flag<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<StatusCode> {
    let reason = reason_of(body);
    moderation(&state)
        .dismiss_flag(&Actor::from(&user), FlagId::from_uuid(id), reason.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/forum/mod/posts/{id}/hide
pub async fn hide_post<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<StatusCode> {
    let reason = reason_of(body);
    moderation(&state)
        .hide_post(&Actor::from(&user), PostId::from_uuid(id), reason.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/forum/mod/posts/{id}/restore
pub async fn restore_post<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<StatusCode> {
    let reason = reason_of(body);
    moderation(&state)
        .restore_post(&Actor::from(&user), PostId::from_uuid(id), reason.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn switch_topic<S: ForumStore>(
    state: ForumAppState<S>,
    user: CurrentUser,
    id: Uuid,
    switch: TopicSwitch,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<Json<TopicResponse>> {
    let reason = reason_of(body);
    let topic = moderation(&state)
        .switch_topic(
            &Actor::from(&user),
            TopicId::from_uuid(id),
            switch,
            reason.as_deref(),
        )
        .await?;
    Ok(Json(topic.into()))
}

/// POST /api/forum/mod/topics/{id}/lock
pub async fn lock_topic<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<Json<TopicResponse>> {
    switch_topic(state, user, id, TopicSwitch::Lock, body).await
}

/// POST /api/forum/mod/topics/{id}/unlock
pub async fn unlock_topic<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<Json<TopicResponse>> {
    switch_topic(state, user, id, TopicSwitch::Unlock, body).await
}

/// POST /api/forum/mod/topics/{id}/pin
pub async fn pin_topic<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<Json<TopicResponse>> {
    switch_topic(state, user, id, TopicSwitch::Pin, body).await
}

/// POST /api/forum/mod/topics/{id}/unpin
pub async fn unpin_topic<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<Json<TopicResponse>> {
    switch_topic(state, user, id, TopicSwitch::Unpin, body).await
}

/// POST /api/forum/mod/members/{public_id}/warn
pub async fn warn_member<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(public_id): Path<String>,
    Json(req): Json<WarnRequest>,
) -> ForumResult<StatusCode> {
    let public_id = parse_public_id(&public_id)?;
    moderation(&state)
        .warn_member(&Actor::from(&user), &public_id, &req.reason)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/forum/mod/members/{public_id}/ban
pub async fn ban_member<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(public_id): Path<String>,
    body: Option<Json<BanRequest>>,
) -> ForumResult<Json<MemberResponse>> {
    let public_id = parse_public_id(&public_id)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let member = moderation(&state)
        .ban_member(
            &Actor::from(&user),
            &public_id,
            req.days,
            req.reason.as_deref(),
        )
        .await?;
    Ok(Json(MemberResponse::from(&member)))
}

/// POST /api/forum/mod/members/{public_id}/unban
pub async fn unban_member<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(public_id): Path<String>,
    body: Option<Json<ReasonRequest>>,
) -> ForumResult<StatusCode> {
    let public_id = parse_public_id(&public_id)?;
    let reason = reason_of(body);
    moderation(&state)
        .unban_member(&Actor::from(&user), &public_id, reason.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/forum/mod/members/{public_id}/role
pub async fn change_role<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(public_id): Path<String>,
    Json(req): Json<RoleRequest>,
) -> ForumResult<Json<MemberResponse>> {
    let public_id = parse_public_id(&public_id)?;
    let member = moderation(&state)
        .change_role(
            &Actor::from(&user),
            &public_id,
            req.role,
            req.reason.as_deref(),
        )
        .await?;
    Ok(Json(MemberResponse::from(&member)))
}

/// GET /api/forum/mod/log
pub async fn moderation_log<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Query(page): Query<PageRequest>,
) -> ForumResult<Json<Page<ModerationEntryResponse>>> {
    let entries = moderation(&state)
        .list_log(&Actor::from(&user), page)
        .await?;
    Ok(Json(entries.map(Into::into)))
}

// ============================================================================
// Admins
// ============================================================================

/// POST /api/forum/admin/categories
pub async fn create_category<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Json(req): Json<CategoryRequest>,
) -> ForumResult<(StatusCode, Json<CategoryResponse>)> {
    let category = CategoryUseCase::new(state.store.clone())
        .create(
            &Actor::from(&user),
            CategoryInput {
                slug: req.slug,
                title: req.title,
                description: req.description,
                position: req.position,
                min_role: req.min_role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /api/forum/admin/categories/{id}
pub async fn update_category<S: ForumStore>(
    State(state): State<ForumAppState<S>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryUpdateRequest>,
) -> ForumResult<Json<CategoryResponse>> {
    let category = CategoryUseCase::new(state.store.clone())
        .update(
            &Actor::from(&user),
            CategoryId::from_uuid(id),
            CategoryUpdate {
                slug: req.slug,
                title: req.title,
                description: req.description,
                position: req.position,
                min_role: req.min_role,
            },
        )
        .await?;

    Ok(Json(category.into()))
}
