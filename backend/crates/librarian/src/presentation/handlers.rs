//! HTTP Handlers

use std::sync::Arc;

use auth::CurrentUser;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::ArticleId;
use kernel::page::{Page, PageRequest};
use platform::rate_limit::RateLimitStore;
use uuid::Uuid;

use crate::application::{ArticlesUseCase, ChatUseCase, LibrarianConfig};
use crate::domain::model::LanguageModel;
use crate::domain::repository::LibrarianStore;
use crate::error::LibrarianResult;
use crate::presentation::dto::{
    ArticleRequest, ArticleResponse, ChatLogResponse, ChatRequest, ChatResponse, SearchHitResponse,
    SearchQuery, UpdateArticleRequest,
};

pub struct LibrarianAppState<S, L, M>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    pub store: Arc<S>,
    pub limiter: Arc<L>,
    /// `None` disables chat
    pub model: Option<Arc<M>>,
    pub config: Arc<LibrarianConfig>,
}

impl<S, L, M> Clone for LibrarianAppState<S, L, M>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            limiter: self.limiter.clone(),
            model: self.model.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, L, M> LibrarianAppState<S, L, M>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    fn articles(&self) -> ArticlesUseCase<S> {
        ArticlesUseCase::new(self.store.clone())
    }

    fn chat(&self) -> ChatUseCase<S, L, M> {
        ChatUseCase::new(
            self.store.clone(),
            self.limiter.clone(),
            self.model.clone(),
            self.config.clone(),
        )
    }
}

// ============================================================================
// Members
// ============================================================================

/// GET /api/librarian/articles
pub async fn list_articles<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Query(page): Query<PageRequest>,
) -> LibrarianResult<Json<Page<ArticleResponse>>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let articles = state.articles().list(true, page).await?;
    Ok(Json(articles.map(Into::into)))
}

/// GET /api/librarian/articles/{id}
pub async fn get_article<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Path(id): Path<Uuid>,
) -> LibrarianResult<Json<ArticleResponse>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let article = state
        .articles()
        .get_published(ArticleId::from_uuid(id))
        .await?;
    Ok(Json(article.into()))
}

/// GET /api/librarian/search?q=
pub async fn search<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Query(query): Query<SearchQuery>,
) -> LibrarianResult<Json<Vec<SearchHitResponse>>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let hits = state.chat().search(&query.q).await?;
    Ok(Json(hits.into_iter().map(Into::into).collect()))
}

/// POST /api/librarian/chat
pub async fn chat<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    user: CurrentUser,
    Json(req): Json<ChatRequest>,
) -> LibrarianResult<Json<ChatResponse>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let answer = state
        .chat()
        .ask(user.user_id, &req.question, &req.history)
        .await?;
    Ok(Json(answer.into()))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/librarian/admin/articles
pub async fn admin_list_articles<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Query(page): Query<PageRequest>,
) -> LibrarianResult<Json<Page<ArticleResponse>>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let articles = state.articles().list(false, page).await?;
    Ok(Json(articles.map(Into::into)))
}

/// GET /api/librarian/admin/articles/{id}
pub async fn admin_get_article<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Path(id): Path<Uuid>,
) -> LibrarianResult<Json<ArticleResponse>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let article = state.articles().get(ArticleId::from_uuid(id)).await?;
    Ok(Json(article.into()))
}

/// POST /api/librarian/admin/articles
pub async fn create_article<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    user: CurrentUser,
    Json(req): Json<ArticleRequest>,
) -> LibrarianResult<(StatusCode, Json<ArticleResponse>)>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let article = state.articles().create(user.user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(article.into())))
}

/// PATCH /api/librarian/admin/articles/{id}
pub async fn update_article<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateArticleRequest>,
) -> LibrarianResult<Json<ArticleResponse>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let article = state
        .articles()
        .update(ArticleId::from_uuid(id), req.into())
        .await?;
    Ok(Json(article.into()))
}

/// DELETE /api/librarian/admin/articles/{id}
pub async fn delete_article<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Path(id): Path<Uuid>,
) -> LibrarianResult<StatusCode>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    state.articles().delete(ArticleId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/librarian/admin/chats
pub async fn list_chats<S, L, M>(
    State(state): State<LibrarianAppState<S, L, M>>,
    Query(page): Query<PageRequest>,
) -> LibrarianResult<Json<Page<ChatLogResponse>>>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    let chats = state.chat().list_chats(page).await?;
    Ok(Json(chats.map(Into::into)))
}
