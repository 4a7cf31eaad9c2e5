//! PostgreSQL Implementation

use auth::UserId;
use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::CmsPostId;
use kernel::page::PageRequest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{LandingBlock, NewsPost, NewsPostView, PostStatus};
use crate::domain::repository::{LandingRepository, NewsRepository};
use crate::error::{CmsError, CmsResult};

const NEWS_COLUMNS: &str = r#"
    p.post_id,
    p.title,
    p.slug,
    p.excerpt,
    p.body,
    p.cover_url,
    p.status,
    p.published_at,
    p.author_id,
    p.created_at,
    p.updated_at,
    COALESCE(u.user_name, '') AS author_name
"#;

const NEWS_ORDER: &str = "ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC";

#[derive(Clone)]
pub struct PgCmsStore {
    pool: PgPool,
}

impl PgCmsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_news(&self, clause: &str, value: Uuid) -> CmsResult<Option<NewsPostView>> {
        let sql = format!(
            "SELECT {NEWS_COLUMNS} FROM cms_posts p \
             LEFT JOIN users u ON u.user_id = p.author_id \
             WHERE {clause} = $1"
        );
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(NewsRow::into_view).transpose()
    }
}

// ============================================================================
// Landing
// ============================================================================

impl LandingRepository for PgCmsStore {
    async fn list_blocks(&self, published_only: bool) -> CmsResult<Vec<LandingBlock>> {
        let rows = sqlx::query_as::<_, BlockRow>(
            r#"
            SELECT block_key, content, is_published, updated_by, updated_at
            FROM cms_landing_blocks
            WHERE is_published OR NOT $1
            ORDER BY block_key
            "#,
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BlockRow::into_block).collect())
    }

    async fn upsert_block(&self, block: &LandingBlock) -> CmsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cms_landing_blocks (block_key, content, is_published, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (block_key) DO UPDATE SET
                content = EXCLUDED.content,
                is_published = EXCLUDED.is_published,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&block.key)
        .bind(&block.content)
        .bind(block.is_published)
        .bind(block.updated_by.map(UserId::into_uuid))
        .bind(block.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// News
// ============================================================================

impl NewsRepository for PgCmsStore {
    async fn list_news(
        &self,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> CmsResult<(Vec<NewsPostView>, i64)> {
        let status = status.map(|s| s.code());
        let sql = format!(
            "SELECT {NEWS_COLUMNS} FROM cms_posts p \
             LEFT JOIN users u ON u.user_id = p.author_id \
             WHERE ($1::text IS NULL OR p.status = $1) \
             {NEWS_ORDER} \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM cms_posts WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(NewsRow::into_view)
            .collect::<CmsResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn find_news(&self, id: CmsPostId) -> CmsResult<Option<NewsPostView>> {
        self.fetch_news("p.post_id", id.into_uuid()).await
    }

    async fn find_news_by_slug(&self, slug: &str) -> CmsResult<Option<NewsPostView>> {
        let sql = format!(
            "SELECT {NEWS_COLUMNS} FROM cms_posts p \
             LEFT JOIN users u ON u.user_id = p.author_id \
             WHERE p.slug = $1"
        );
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(NewsRow::into_view).transpose()
    }

    async fn slug_taken(&self, slug: &str, except: Option<CmsPostId>) -> CmsResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM cms_posts
                WHERE slug = $1 AND ($2::uuid IS NULL OR post_id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(except.map(CmsPostId::into_uuid))
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn create_news(&self, post: &NewsPost) -> CmsResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO cms_posts (
                post_id,
                title,
                slug,
                excerpt,
                body,
                cover_url,
                status,
                published_at,
                author_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(&post.cover_url)
        .bind(post.status.code())
        .bind(post.published_at)
        .bind(post.author_id.as_uuid())
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Err(e) if is_unique_violation(&e) => Err(CmsError::SlugTaken(post.slug.clone())),
            other => other.map(|_| ()).map_err(CmsError::from),
        }
    }

    async fn update_news(&self, post: &NewsPost) -> CmsResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE cms_posts SET
                title = $2,
                slug = $3,
                excerpt = $4,
                body = $5,
                cover_url = $6,
                status = $7,
                published_at = $8,
                updated_at = $9
            WHERE post_id = $1
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(&post.cover_url)
        .bind(post.status.code())
        .bind(post.published_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await;

        match updated {
            Err(e) if is_unique_violation(&e) => Err(CmsError::SlugTaken(post.slug.clone())),
            Err(e) => Err(e.into()),
            Ok(result) if result.rows_affected() == 0 => Err(CmsError::NotFound("Post")),
            Ok(_) => Ok(()),
        }
    }

    async fn delete_news(&self, id: CmsPostId) -> CmsResult<bool> {
        let result = sqlx::query("DELETE FROM cms_posts WHERE post_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(sqlx::FromRow)]
struct BlockRow {
    block_key: String,
    content: serde_json::Value,
    is_published: bool,
    updated_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

impl BlockRow {
    fn into_block(self) -> LandingBlock {
        LandingBlock {
            key: self.block_key,
            content: self.content,
            is_published: self.is_published,
            updated_by: self.updated_by.map(UserId::from_uuid),
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NewsRow {
    post_id: Uuid,
    title: String,
    slug: String,
    excerpt: String,
    body: String,
    cover_url: Option<String>,
    status: String,
    published_at: Option<DateTime<Utc>>,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: String,
}

impl NewsRow {
    fn into_view(self) -> CmsResult<NewsPostView> {
        let status = PostStatus::from_code(&self.status)
            .ok_or_else(|| CmsError::Internal(format!("Invalid post status: {}", self.status)))?;

        Ok(NewsPostView {
            post: NewsPost {
                id: CmsPostId::from_uuid(self.post_id),
                title: self.title,
                slug: self.slug,
                excerpt: self.excerpt,
                body: self.body,
                cover_url: self.cover_url,
                status,
                published_at: self.published_at,
                author_id: UserId::from_uuid(self.author_id),
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            author_name: self.author_name,
        })
    }
}
