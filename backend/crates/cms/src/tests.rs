//! Use case and router tests against an in-memory store

use std::sync::{Arc, Mutex};

use auth::domain::repository::{AuthSessionRepository, UserRepository};
use auth::domain::{AuthSession, Credential, User};
use auth::{AuthConfig, AuthMiddlewareState, AuthResult, PublicId, UserId, UserName, UserRole};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use kernel::id::CmsPostId;
use kernel::page::PageRequest;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::application::{LandingUseCase, NewsInput, NewsUpdate, NewsUseCase};
use crate::domain::entities::{LandingBlock, NewsPost, NewsPostView, PostStatus};
use crate::domain::repository::{LandingRepository, NewsRepository};
use crate::error::{CmsError, CmsResult};
use crate::presentation::router::cms_router_generic;

#[derive(Default)]
struct MemoryData {
    blocks: Vec<LandingBlock>,
    posts: Vec<NewsPost>,
}

#[derive(Clone, Default)]
struct MemoryCmsStore {
    inner: Arc<Mutex<MemoryData>>,
}

fn view(post: &NewsPost) -> NewsPostView {
    NewsPostView {
        post: post.clone(),
        author_name: "editor".to_string(),
    }
}

impl LandingRepository for MemoryCmsStore {
    async fn list_blocks(&self, published_only: bool) -> CmsResult<Vec<LandingBlock>> {
        let data = self.inner.lock().unwrap();
        let mut blocks: Vec<_> = data
            .blocks
            .iter()
            .filter(|b| b.is_published || !published_only)
            .cloned()
            .collect();
        blocks.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(blocks)
    }

    async fn upsert_block(&self, block: &LandingBlock) -> CmsResult<()> {
        let mut data = self.inner.lock().unwrap();
        data.blocks.retain(|b| b.key != block.key);
        data.blocks.push(block.clone());
        Ok(())
    }
}

impl NewsRepository for MemoryCmsStore {
    async fn list_news(
        &self,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> CmsResult<(Vec<NewsPostView>, i64)> {
        let data = self.inner.lock().unwrap();
        let mut posts: Vec<_> = data
            .posts
            .iter()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        let total = posts.len() as i64;
        let items = posts
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(view)
            .collect();
        Ok((items, total))
    }

    async fn find_news(&self, id: CmsPostId) -> CmsResult<Option<NewsPostView>> {
        let data = self.inner.lock().unwrap();
        Ok(data.posts.iter().find(|p| p.id == id).map(view))
    }

    async fn find_news_by_slug(&self, slug: &str) -> CmsResult<Option<NewsPostView>> {
        let data = self.inner.lock().unwrap();
        Ok(data.posts.iter().find(|p| p.slug == slug).map(view))
    }

    async fn slug_taken(&self, slug: &str, except: Option<CmsPostId>) -> CmsResult<bool> {
        let data = self.inner.lock().unwrap();
        Ok(data
            .posts
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != except))
    }

    async fn create_news(&self, post: &NewsPost) -> CmsResult<()> {
        let mut data = self.inner.lock().unwrap();
        if data.posts.iter().any(|p| p.slug == post.slug) {
            return Err(CmsError::SlugTaken(post.slug.clone()));
        }
        data.posts.push(post.clone());
        Ok(())
    }

    async fn update_news(&self, post: &NewsPost) -> CmsResult<()> {
        let mut data = self.inner.lock().unwrap();
        let existing = data
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(CmsError::NotFound("Post"))?;
        *existing = post.clone();
        Ok(())
    }

    async fn delete_news(&self, id: CmsPostId) -> CmsResult<bool> {
        let mut data = self.inner.lock().unwrap();
        let before = data.posts.len();
        data.posts.retain(|p| p.id != id);
        Ok(data.posts.len() < before)
    }
}

fn setup() -> (Arc<MemoryCmsStore>, UserId) {
    (Arc::new(MemoryCmsStore::default()), UserId::new())
}

fn input(title: &str, publish: bool) -> NewsInput {
    NewsInput {
        title: title.to_string(),
        slug: None,
        excerpt: "Short teaser".to_string(),
        body: "# Heading\n\nText".to_string(),
        cover_url: None,
        publish,
    }
}

#[tokio::test]
async fn test_slug_from_cyrillic_title_and_duplicates() {
    let (store, editor) = setup();
    let news = NewsUseCase::new(store.clone());

    let created = news
        .create(editor, input("Весенняя встреча", false))
        .await
        .unwrap();
    assert_eq!(created.post.slug, "vesennyaya-vstrecha");
    assert_eq!(created.post.status, PostStatus::Draft);
    assert!(created.post.published_at.is_none());

    match news.create(editor, input("Весенняя встреча!", false)).await {
        Err(e @ CmsError::SlugTaken(_)) => assert_eq!(e.status_code(), StatusCode::CONFLICT),
        other => panic!("expected slug conflict, got {other:?}"),
    }

    let mut explicit = input("Весенняя встреча", true);
    explicit.slug = Some("spring-meetup".to_string());
    let created = news.create(editor, explicit).await.unwrap();
    assert_eq!(created.post.slug, "spring-meetup");
    assert!(created.post.published_at.is_some());

    assert!(matches!(
        news.create(editor, input("???", false)).await,
        Err(CmsError::Validation(_))
    ));
}

#[tokio::test]
async fn test_drafts_stay_private_until_published() {
    let (store, editor) = setup();
    let news = NewsUseCase::new(store.clone());
    let draft = news.create(editor, input("Quiet draft", false)).await.unwrap();

    assert!(matches!(
        news.get_published("quiet-draft").await,
        Err(CmsError::NotFound(_))
    ));
    assert_eq!(news.list_published(PageRequest::default()).await.unwrap().total, 0);
    assert_eq!(news.list_all(None, PageRequest::default()).await.unwrap().total, 1);

    let published = news.publish(draft.post.id).await.unwrap();
    let first_published_at = published.post.published_at;
    assert!(first_published_at.is_some());
    assert_eq!(news.get_published("quiet-draft").await.unwrap().post.id, draft.post.id);
    assert!(matches!(
        news.publish(draft.post.id).await,
        Err(CmsError::Conflict(_))
    ));

    news.unpublish(draft.post.id).await.unwrap();
    assert!(news.get_published("quiet-draft").await.is_err());
    let republished = news.publish(draft.post.id).await.unwrap();
    assert_eq!(republished.post.published_at, first_published_at);
}

#[tokio::test]
async fn test_update_keeps_slug_unless_set() {
    let (store, editor) = setup();
    let news = NewsUseCase::new(store.clone());
    let first = news.create(editor, input("First post", true)).await.unwrap();
    news.create(editor, input("Second post", true)).await.unwrap();

    let updated = news
        .update(
            first.post.id,
            NewsUpdate {
                title: Some("First post, revised".to_string()),
                cover_url: Some("https://cdn.example.org/cover.jpg".to_string()),
                ..NewsUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.post.slug, "first-post");
    assert_eq!(updated.post.title, "First post, revised");
    assert!(updated.post.cover_url.is_some());

    assert!(matches!(
        news.update(
            first.post.id,
            NewsUpdate {
                slug: Some("second-post".to_string()),
                ..NewsUpdate::default()
            },
        )
        .await,
        Err(CmsError::SlugTaken(_))
    ));

    let cleared = news
        .update(
            first.post.id,
            NewsUpdate {
                cover_url: Some(String::new()),
                ..NewsUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.post.cover_url, None);
}

#[tokio::test]
async fn test_delete() {
    let (store, editor) = setup();
    let news = NewsUseCase::new(store.clone());
    let post = news.create(editor, input("Short lived", true)).await.unwrap();

    news.delete(post.post.id).await.unwrap();
    assert!(matches!(
        news.delete(post.post.id).await,
        Err(CmsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_landing_blocks() {
    let (store, editor) = setup();
    let landing = LandingUseCase::new(store.clone());

    landing
        .put_block(editor, "hero", json!({ "headline": "Свобода" }), true)
        .await
        .unwrap();
    landing
        .put_block(editor, "faq", json!([{ "q": "Who?" }]), false)
        .await
        .unwrap();

    let public = landing.public_blocks().await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public["hero"]["headline"], "Свобода");
    assert_eq!(landing.all_blocks().await.unwrap().len(), 2);

    // Saving again replaces the block
    landing
        .put_block(editor, "faq", json!([]), true)
        .await
        .unwrap();
    assert_eq!(landing.public_blocks().await.unwrap().len(), 2);

    assert!(matches!(
        landing.put_block(editor, "Hero!", json!({}), true).await,
        Err(CmsError::Validation(_))
    ));
    assert!(matches!(
        landing.put_block(editor, "hero", serde_json::Value::Null, true).await,
        Err(CmsError::Validation(_))
    ));
}

/// Auth store without any users or sessions
struct NoSessions;

impl UserRepository for NoSessions {
    async fn create(&self, _user: &User, _credential: &Credential) -> AuthResult<()> {
        Ok(())
    }

    async fn find_by_id(&self, _user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(None)
    }

    async fn find_by_public_id(&self, _public_id: &PublicId) -> AuthResult<Option<User>> {
        Ok(None)
    }

    async fn find_by_user_name(&self, _user_name: &UserName) -> AuthResult<Option<User>> {
        Ok(None)
    }

    async fn exists_by_user_name(&self, _user_name: &UserName) -> AuthResult<bool> {
        Ok(false)
    }

    async fn update(&self, _user: &User) -> AuthResult<()> {
        Ok(())
    }

    async fn set_role(&self, _user_id: &UserId, _role: UserRole) -> AuthResult<()> {
        Ok(())
    }
}

impl AuthSessionRepository for NoSessions {
    async fn create(&self, _session: &AuthSession) -> AuthResult<()> {
        Ok(())
    }

    async fn find_by_id(&self, _session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        Ok(None)
    }

    async fn update(&self, _session: &AuthSession) -> AuthResult<()> {
        Ok(())
    }

    async fn delete(&self, _session_id: Uuid) -> AuthResult<()> {
        Ok(())
    }

    async fn delete_all_for_user(&self, _user_id: &UserId) -> AuthResult<u64> {
        Ok(0)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_router_guards_admin_routes() {
    let store = MemoryCmsStore::default();
    let auth = AuthMiddlewareState::new(
        Arc::new(NoSessions),
        Arc::new(AuthConfig::development()),
    );
    let app = cms_router_generic(store, auth);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/landing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/posts/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/admin/posts")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title":"Hello","body":"World"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
