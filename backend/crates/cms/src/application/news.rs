//! News Posts
//!
//! The slug is derived from the title unless the editor sets one, and stays
//! put when the title is edited later so published links keep working.

use std::sync::Arc;

use auth::UserId;
use chrono::Utc;
use kernel::id::CmsPostId;
use kernel::page::{Page, PageRequest};

use crate::domain::entities::{NewsPost, NewsPostView, PostStatus};
use crate::domain::repository::CmsStore;
use crate::domain::slug::{parse_slug, slugify};
use crate::domain::value_objects::{PostTitle, cover_url, excerpt, markdown_body};
use crate::error::{CmsError, CmsResult};

pub struct NewsInput {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: String,
    pub body: String,
    pub cover_url: Option<String>,
    pub publish: bool,
}

/// Absent fields keep their current value
#[derive(Default)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    /// Blank string clears the cover
    pub cover_url: Option<String>,
}

pub struct NewsUseCase<S>
where
    S: CmsStore,
{
    store: Arc<S>,
}

impl<S> NewsUseCase<S>
where
    S: CmsStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_published(&self, page: PageRequest) -> CmsResult<Page<NewsPostView>> {
        let (items, total) = self
            .store
            .list_news(Some(PostStatus::Published), page)
            .await?;
        Ok(Page::new(items, total, page))
    }

    /// Drafts are not found
    pub async fn get_published(&self, slug: &str) -> CmsResult<NewsPostView> {
        self.store
            .find_news_by_slug(slug)
            .await?
            .filter(|view| view.post.is_public())
            .ok_or(CmsError::NotFound("Post"))
    }

    pub async fn list_all(
        &self,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> CmsResult<Page<NewsPostView>> {
        let (items, total) = self.store.list_news(status, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn get(&self, id: CmsPostId) -> CmsResult<NewsPostView> {
        self.store
            .find_news(id)
            .await?
            .ok_or(CmsError::NotFound("Post"))
    }

    pub async fn create(&self, author: UserId, input: NewsInput) -> CmsResult<NewsPostView> {
        let title = PostTitle::new(&input.title)?;
        let slug = match input.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => parse_slug(slug)?,
            _ => slugify(title.as_str()).ok_or_else(|| {
                CmsError::Validation("Title must contain letters or digits".to_string())
            })?,
        };
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let post = NewsPost {
            id: CmsPostId::new(),
            title: title.into_inner(),
            slug,
            excerpt: excerpt(&input.excerpt)?,
            body: markdown_body(&input.body)?,
            cover_url: input.cover_url.as_deref().map(cover_url).transpose()?.flatten(),
            status: if input.publish {
                PostStatus::Published
            } else {
                PostStatus::Draft
            },
            published_at: input.publish.then_some(now),
            author_id: author,
            created_at: now,
            updated_at: now,
        };
        self.store.create_news(&post).await?;

        tracing::info!(
            post_id = %post.id,
            slug = %post.slug,
            status = post.status.code(),
            "News post created"
        );
        self.get(post.id).await
    }

    pub async fn update(&self, id: CmsPostId, update: NewsUpdate) -> CmsResult<NewsPostView> {
        let mut post = self.get(id).await?.post;

        if let Some(title) = update.title {
            post.title = PostTitle::new(&title)?.into_inner();
        }
        if let Some(slug) = update.slug {
            let slug = parse_slug(&slug)?;
            if slug != post.slug {
                self.ensure_slug_free(&slug, Some(post.id)).await?;
                post.slug = slug;
            }
        }
        if let Some(value) = update.excerpt {
            post.excerpt = excerpt(&value)?;
        }
        if let Some(body) = update.body {
            post.body = markdown_body(&body)?;
        }
        if let Some(url) = update.cover_url {
            post.cover_url = cover_url(&url)?;
        }
        post.updated_at = Utc::now();

        self.store.update_news(&post).await?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "News post updated");
        self.get(post.id).await
    }

    pub async fn publish(&self, id: CmsPostId) -> CmsResult<NewsPostView> {
        let mut post = self.get(id).await?.post;
        if post.status == PostStatus::Published {
            return Err(CmsError::Conflict("Post is already published".to_string()));
        }

        let now = Utc::now();
        post.status = PostStatus::Published;
        post.published_at.get_or_insert(now);
        post.updated_at = now;
        self.store.update_news(&post).await?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "News post published");
        self.get(post.id).await
    }

    pub async fn unpublish(&self, id: CmsPostId) -> CmsResult<NewsPostView> {
        let mut post = self.get(id).await?.post;
        if post.status == PostStatus::Draft {
            return Err(CmsError::Conflict("Post is not published".to_string()));
        }

        post.status = PostStatus::Draft;
        post.updated_at = Utc::now();
        self.store.update_news(&post).await?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "News post unpublished");
        self.get(post.id).await
    }

    pub async fn delete(&self, id: CmsPostId) -> CmsResult<()> {
        if !self.store.delete_news(id).await? {
            return Err(CmsError::NotFound("Post"));
        }
        tracing::info!(post_id = %id, "News post deleted");
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<CmsPostId>) -> CmsResult<()> {
        if self.store.slug_taken(slug, except).await? {
            return Err(CmsError::SlugTaken(slug.to_string()));
        }
        Ok(())
    }
}
