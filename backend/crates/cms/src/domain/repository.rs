//! Repository Traits

use kernel::id::CmsPostId;
use kernel::page::PageRequest;

use crate::domain::entities::{LandingBlock, NewsPost, NewsPostView, PostStatus};
use crate::error::CmsResult;

#[trait_variant::make(LandingRepository: Send)]
pub trait LocalLandingRepository {
    /// Ordered by key
    async fn list_blocks(&self, published_only: bool) -> CmsResult<Vec<LandingBlock>>;

    /// Insert or replace by key
    async fn upsert_block(&self, block: &LandingBlock) -> CmsResult<()>;
}

#[trait_variant::make(NewsRepository: Send)]
pub trait LocalNewsRepository {
    /// Newest first: publication time, then creation time
    async fn list_news(
        &self,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> CmsResult<(Vec<NewsPostView>, i64)>;

    async fn find_news(&self, id: CmsPostId) -> CmsResult<Option<NewsPostView>>;

    async fn find_news_by_slug(&self, slug: &str) -> CmsResult<Option<NewsPostView>>;

    /// Taken by a post other than `except`
    async fn slug_taken(&self, slug: &str, except: Option<CmsPostId>) -> CmsResult<bool>;

    /// Duplicate slug is `CmsError::SlugTaken`
    async fn create_news(&self, post: &NewsPost) -> CmsResult<()>;

    /// Duplicate slug is `CmsError::SlugTaken`
    async fn update_news(&self, post: &NewsPost) -> CmsResult<()>;

    /// Whether a row was removed
    async fn delete_news(&self, id: CmsPostId) -> CmsResult<bool>;
}

pub trait CmsStore: LandingRepository + NewsRepository + Send + Sync + 'static {}

impl<T> CmsStore for T where T: LandingRepository + NewsRepository + Send + Sync + 'static {}
