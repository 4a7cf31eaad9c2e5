//! Repository Traits

use kernel::id::ArticleId;
use kernel::page::PageRequest;

use crate::domain::entities::{Article, ChatLogEntry, ChatLogView};
use crate::error::LibrarianResult;

#[trait_variant::make(ArticleRepository: Send)]
pub trait LocalArticleRepository {
    /// Most recently updated first
    async fn list_articles(
        &self,
        published_only: bool,
        page: PageRequest,
    ) -> LibrarianResult<(Vec<Article>, i64)>;

    async fn find_article(&self, id: ArticleId) -> LibrarianResult<Option<Article>>;

    async fn create_article(&self, article: &Article) -> LibrarianResult<()>;

    async fn update_article(&self, article: &Article) -> LibrarianResult<()>;

    /// `false` when nothing was deleted
    async fn delete_article(&self, id: ArticleId) -> LibrarianResult<bool>;

    /// Published articles whose title, tags or body contain any of `terms`
    /// (case-insensitive), at most `limit`.
    async fn search_candidates(
        &self,
        terms: &[String],
        limit: i64,
    ) -> LibrarianResult<Vec<Article>>;
}

#[trait_variant::make(ChatLogRepository: Send)]
pub trait LocalChatLogRepository {
    async fn record_chat(&self, entry: &ChatLogEntry) -> LibrarianResult<()>;

    /// Newest first
    async fn list_chats(&self, page: PageRequest) -> LibrarianResult<(Vec<ChatLogView>, i64)>;
}

pub trait LibrarianStore: ArticleRepository + ChatLogRepository + Send + Sync + 'static {}

impl<T> LibrarianStore for T where T: ArticleRepository + ChatLogRepository + Send + Sync + 'static {}
