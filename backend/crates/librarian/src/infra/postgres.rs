//! PostgreSQL Implementation

use auth::UserId;
use chrono::{DateTime, Utc};
use kernel::id::{ArticleId, ChatLogEntryId};
use kernel::page::PageRequest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Article, ChatLogEntry, ChatLogView};
use crate::domain::repository::{ArticleRepository, ChatLogRepository};
use crate::error::{LibrarianError, LibrarianResult};

const ARTICLE_COLUMNS: &str = r#"
    article_id,
    title,
    body,
    tags,
    is_published,
    author_id,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct PgLibrarianStore {
    pool: PgPool,
}

impl PgLibrarianStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// ============================================================================
// Articles
// ============================================================================

impl ArticleRepository for PgLibrarianStore {
    async fn list_articles(
        &self,
        published_only: bool,
        page: PageRequest,
    ) -> LibrarianResult<(Vec<Article>, i64)> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM librarian_articles \
             WHERE is_published OR NOT $1 \
             ORDER BY updated_at DESC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(published_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM librarian_articles WHERE is_published OR NOT $1",
        )
        .bind(published_only)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(ArticleRow::into_article).collect(), total))
    }

    async fn find_article(&self, id: ArticleId) -> LibrarianResult<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM librarian_articles WHERE article_id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ArticleRow::into_article))
    }

    async fn create_article(&self, article: &Article) -> LibrarianResult<()> {
        sqlx::query(
            r#"
            INSERT INTO librarian_articles (
                article_id,
                title,
                body,
                tags,
                is_published,
                author_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(article.id.as_uuid())
        .bind(&article.title)
        .bind(&article.body)
        .bind(&article.tags)
        .bind(article.is_published)
        .bind(article.author_id.map(UserId::into_uuid))
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_article(&self, article: &Article) -> LibrarianResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE librarian_articles
            SET title = $2, body = $3, tags = $4, is_published = $5, updated_at = $6
            WHERE article_id = $1
            "#,
        )
        .bind(article.id.as_uuid())
        .bind(&article.title)
        .bind(&article.body)
        .bind(&article.tags)
        .bind(article.is_published)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibrarianError::NotFound("Article"));
        }
        Ok(())
    }

    async fn delete_article(&self, id: ArticleId) -> LibrarianResult<bool> {
        let result = sqlx::query("DELETE FROM librarian_articles WHERE article_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_candidates(
        &self,
        terms: &[String],
        limit: i64,
    ) -> LibrarianResult<Vec<Article>> {
        let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();

        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM librarian_articles \
             WHERE is_published \
               AND ( \
                   title ILIKE ANY($1) \
                   OR body ILIKE ANY($1) \
                   OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ANY($1)) \
               ) \
             ORDER BY updated_at DESC \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(&patterns)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }
}

// ============================================================================
// Chat log
// ============================================================================

impl ChatLogRepository for PgLibrarianStore {
    async fn record_chat(&self, entry: &ChatLogEntry) -> LibrarianResult<()> {
        let source_ids: Vec<Uuid> = entry.source_ids.iter().map(|id| id.into_uuid()).collect();

        sqlx::query(
            r#"
            INSERT INTO librarian_chat_log (entry_id, user_id, question, answer, source_ids, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.user_id.as_uuid())
        .bind(&entry.question)
        .bind(&entry.answer)
        .bind(&source_ids)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_chats(&self, page: PageRequest) -> LibrarianResult<(Vec<ChatLogView>, i64)> {
        let rows = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT c.entry_id, c.user_id, c.question, c.answer, c.source_ids, c.created_at,
                   u.user_name
            FROM librarian_chat_log c
            LEFT JOIN users u ON u.user_id = c.user_id
            ORDER BY c.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM librarian_chat_log")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(ChatRow::into_view).collect(), total))
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(sqlx::FromRow)]
struct ArticleRow {
    article_id: Uuid,
    title: String,
    body: String,
    tags: Vec<String>,
    is_published: bool,
    author_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ArticleRow {
    fn into_article(self) -> Article {
        Article {
            id: ArticleId::from_uuid(self.article_id),
            title: self.title,
            body: self.body,
            tags: self.tags,
            is_published: self.is_published,
            author_id: self.author_id.map(UserId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChatRow {
    entry_id: Uuid,
    user_id: Uuid,
    question: String,
    answer: String,
    source_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    user_name: Option<String>,
}

impl ChatRow {
    fn into_view(self) -> ChatLogView {
        ChatLogView {
            entry: ChatLogEntry {
                id: ChatLogEntryId::from_uuid(self.entry_id),
                user_id: UserId::from_uuid(self.user_id),
                question: self.question,
                answer: self.answer,
                source_ids: self.source_ids.into_iter().map(ArticleId::from_uuid).collect(),
                created_at: self.created_at,
            },
            user_name: self.user_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("budget"), "%budget%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
