//! Knowledge Base Articles

use std::sync::Arc;

use auth::UserId;
use chrono::Utc;
use kernel::id::ArticleId;
use kernel::page::{Page, PageRequest};

use crate::domain::entities::Article;
use crate::domain::repository::LibrarianStore;
use crate::domain::value_objects::{article_body, article_title, tags};
use crate::error::{LibrarianError, LibrarianResult};

pub struct ArticleInput {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub is_published: bool,
}

/// Absent fields keep their current value
#[derive(Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

pub struct ArticlesUseCase<S>
where
    S: LibrarianStore,
{
    store: Arc<S>,
}

impl<S> ArticlesUseCase<S>
where
    S: LibrarianStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        published_only: bool,
        page: PageRequest,
    ) -> LibrarianResult<Page<Article>> {
        let (items, total) = self.store.list_articles(published_only, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn get(&self, id: ArticleId) -> LibrarianResult<Article> {
        self.store
            .find_article(id)
            .await?
            .ok_or(LibrarianError::NotFound("Article"))
    }

    /// Unpublished articles are not found
    pub async fn get_published(&self, id: ArticleId) -> LibrarianResult<Article> {
        let article = self.get(id).await?;
        if !article.is_published {
            return Err(LibrarianError::NotFound("Article"));
        }
        Ok(article)
    }

    pub async fn create(&self, author: UserId, input: ArticleInput) -> LibrarianResult<Article> {
        let now = Utc::now();
        let article = Article {
            id: ArticleId::new(),
            title: article_title(&input.title)?,
            body: article_body(&input.body)?,
            tags: tags(&input.tags)?,
            is_published: input.is_published,
            author_id: Some(author),
            created_at: now,
            updated_at: now,
        };
        self.store.create_article(&article).await?;

        tracing::info!(
            article_id = %article.id,
            author = %author,
            published = article.is_published,
            "Article created"
        );
        Ok(article)
    }

    pub async fn update(&self, id: ArticleId, update: ArticleUpdate) -> LibrarianResult<Article> {
        let mut article = self.get(id).await?;

        if let Some(title) = update.title {
            article.title = article_title(&title)?;
        }
        if let Some(body) = update.body {
            article.body = article_body(&body)?;
        }
        if let Some(values) = update.tags {
            article.tags = tags(&values)?;
        }
        if let Some(published) = update.is_published {
            article.is_published = published;
        }
        article.updated_at = Utc::now();
        self.store.update_article(&article).await?;

        tracing::info!(article_id = %id, published = article.is_published, "Article updated");
        Ok(article)
    }

    pub async fn delete(&self, id: ArticleId) -> LibrarianResult<()> {
        if !self.store.delete_article(id).await? {
            return Err(LibrarianError::NotFound("Article"));
        }
        tracing::info!(article_id = %id, "Article deleted");
        Ok(())
    }
}
