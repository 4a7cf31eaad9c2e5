//! PostgreSQL Forum Store
//!
//! Roles live in `users.user_role`; forum-only standing (reputation,
//! warnings, bans) lives in `forum_members`, created lazily on first write.
//!
//! Writes guarded by a daily quota take a per-member advisory lock, count
//! and insert in one transaction. Moderation changes commit together with
//! their log entry or not at all.

use auth::{PublicId, UserId, UserRole};
use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::{CategoryId, FlagId, ModerationEntryId, PostId, TopicId};
use kernel::page::PageRequest;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::{
    AuthorSummary, Category, DailyActivity, Flag, FlagStatus, FlagView, MemberStanding,
    ModerationAction, ModerationChange, ModerationEntry, ModerationEntryView, Post, PostView,
    TargetKind, Topic, TopicSummary, VoteOutcome,
};
use crate::domain::repository::{
    CategoryRepository, FlagRepository, MemberRepository, ModerationLogRepository,
    PostRepository, TopicRepository, VoteRepository,
};
use crate::domain::role_tier::LimitedAction;
use crate::domain::services::{DailyQuota, reputation_delta};
use crate::error::{ForumError, ForumResult};

/// Joined as `u` (users) and `m` (forum_members)
const AUTHOR_COLUMNS: &str = r#"
    u.public_id AS author_public_id,
    u.user_name AS author_user_name,
    u.user_role AS author_role,
    COALESCE(m.reputation, 0) AS author_reputation
"#;

const CATEGORY_COLUMNS: &str = r#"
    c.category_id,
    c.slug,
    c.title,
    c.description,
    c.position,
    c.min_role,
    c.created_at,
    (SELECT COUNT(*) FROM forum_topics t WHERE t.category_id = c.category_id) AS topic_count
"#;

const TOPIC_COLUMNS: &str = r#"
    t.topic_id,
    t.category_id,
    t.author_id,
    t.title,
    t.is_locked,
    t.is_pinned,
    t.post_count,
    t.last_post_at,
    t.created_at
"#;

const POST_COLUMNS: &str = r#"
    p.post_id,
    p.topic_id,
    p.author_id,
    p.body,
    p.is_opening,
    p.score,
    p.is_hidden,
    p.is_deleted,
    p.created_at,
    p.edited_at
"#;

const FLAG_COLUMNS: &str = r#"
    f.flag_id,
    f.post_id,
    f.flagger_id,
    f.reason,
    f.status,
    f.created_at,
    f.resolved_by,
    f.resolved_at
"#;

const STANDING_COLUMNS: &str = r#"
    u.user_id,
    u.public_id,
    u.user_name,
    u.user_role,
    u.created_at AS joined_at,
    COALESCE(m.reputation, 0) AS reputation,
    m.last_warning_at,
    m.banned_at,
    m.banned_until,
    m.ban_reason,
    (
        SELECT COUNT(*) FROM forum_posts p
        WHERE p.author_id = u.user_id AND NOT p.is_deleted AND NOT p.is_hidden
    ) AS post_count
"#;

#[derive(Clone)]
pub struct PgForumStore {
    pool: PgPool,
}

impl PgForumStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_standing(&self, clause: &str, value: &str) -> ForumResult<Option<MemberStanding>> {
        let sql = format!(
            "SELECT {STANDING_COLUMNS} FROM users u \
             LEFT JOIN forum_members m ON m.user_id = u.user_id \
             WHERE {clause} = $1"
        );
        let row = sqlx::query_as::<_, StandingRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(StandingRow::into_standing).transpose()
    }
}

async fn add_reputation(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &Uuid,
    delta: i32,
) -> ForumResult<()> {
    sqlx::query(
        r#"
        INSERT INTO forum_members (user_id, reputation, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (user_id) DO UPDATE SET
            reputation = forum_members.reputation + EXCLUDED.reputation,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Take the member's advisory lock, held until the transaction ends, then
/// check `quota` against what they have done since it started counting.
async fn enforce_quota(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    quota: Option<DailyQuota>,
) -> ForumResult<()> {
    let Some(quota) = quota else {
        return Ok(());
    };

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(user_id.as_uuid().to_string())
        .execute(&mut **tx)
        .await?;

    let sql = match quota.action {
        LimitedAction::Topics => {
            "SELECT COUNT(*) FROM forum_topics WHERE author_id = $1 AND created_at >= $2"
        }
        LimitedAction::Posts => {
            "SELECT COUNT(*) FROM forum_posts \
             WHERE author_id = $1 AND NOT is_opening AND created_at >= $2"
        }
        LimitedAction::Votes => {
            "SELECT COUNT(*) FROM forum_votes WHERE voter_id = $1 AND cast_at >= $2"
        }
        LimitedAction::Flags => {
            "SELECT COUNT(*) FROM forum_flags WHERE flagger_id = $1 AND created_at >= $2"
        }
    };
    let used = sqlx::query_scalar::<_, i64>(sql)
        .bind(user_id.as_uuid())
        .bind(quota.since)
        .fetch_one(&mut **tx)
        .await?;

    quota.admit(u32::try_from(used).unwrap_or(u32::MAX))
}

// ============================================================================
// Categories
// ============================================================================

impl CategoryRepository for PgForumStore {
    async fn list_categories(&self) -> ForumResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM forum_categories c ORDER BY c.position, c.title"
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CategoryRow::into_category).collect()
    }

    async fn find_category(&self, id: CategoryId) -> ForumResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM forum_categories c WHERE c.category_id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(CategoryRow::into_category).transpose()
    }

    async fn find_category_by_slug(&self, slug: &str) -> ForumResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM forum_categories c WHERE c.slug = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CategoryRow::into_category).transpose()
    }

    async fn create_category(&self, category: &Category) -> ForumResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO forum_categories (
                category_id,
                slug,
                title,
                description,
                position,
                min_role,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.slug)
        .bind(&category.title)
        .bind(&category.description)
        .bind(category.position)
        .bind(category.min_role.id())
        .bind(category.created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Err(e) if is_unique_violation(&e) => Err(slug_taken(&category.slug)),
            other => other.map(|_| ()).map_err(ForumError::from),
        }
    }

    async fn update_category(&self, category: &Category) -> ForumResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE forum_categories SET
                slug = $2,
                title = $3,
                description = $4,
                position = $5,
                min_role = $6
            WHERE category_id = $1
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.slug)
        .bind(&category.title)
        .bind(&category.description)
        .bind(category.position)
        .bind(category.min_role.id())
        .execute(&self.pool)
        .await;

        match updated {
            Err(e) if is_unique_violation(&e) => Err(slug_taken(&category.slug)),
            Err(e) => Err(e.into()),
            Ok(result) if result.rows_affected() == 0 => Err(ForumError::NotFound("Category")),
            Ok(_) => Ok(()),
        }
    }
}

fn slug_taken(slug: &str) -> ForumError {
    ForumError::Conflict(format!("Category slug '{slug}' is already taken"))
}

// ============================================================================
// Topics
// ============================================================================

impl TopicRepository for PgForumStore {
    async fn list_topics(
        &self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> ForumResult<(Vec<TopicSummary>, i64)> {
        let sql = format!(
            "SELECT {TOPIC_COLUMNS}, {AUTHOR_COLUMNS} FROM forum_topics t \
             JOIN users u ON u.user_id = t.author_id \
             LEFT JOIN forum_members m ON m.user_id = u.user_id \
             WHERE t.category_id = $1 \
             ORDER BY t.is_pinned DESC, t.last_post_at DESC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, TopicSummaryRow>(&sql)
            .bind(category_id.as_uuid())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM forum_topics WHERE category_id = $1",
        )
        .bind(category_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TopicSummaryRow::into_summary)
            .collect::<ForumResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn find_topic(&self, id: TopicId) -> ForumResult<Option<Topic>> {
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM forum_topics t WHERE t.topic_id = $1");
        let row = sqlx::query_as::<_, TopicRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(TopicRow::into_topic))
    }

    async fn create_topic(
        &self,
        topic: &Topic,
        opening: &Post,
        quota: Option<DailyQuota>,
    ) -> ForumResult<()> {
        let mut tx = self.pool.begin().await?;
        enforce_quota(&mut tx, topic.author_id, quota).await?;

        sqlx::query(
            r#"
            INSERT INTO forum_topics (
                topic_id,
                category_id,
                author_id,
                title,
                is_locked,
                is_pinned,
                post_count,
                last_post_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(topic.id.as_uuid())
        .bind(topic.category_id.as_uuid())
        .bind(topic.author_id.as_uuid())
        .bind(&topic.title)
        .bind(topic.is_locked)
        .bind(topic.is_pinned)
        .bind(topic.post_count)
        .bind(topic.last_post_at)
        .bind(topic.created_at)
        .execute(&mut *tx)
        .await?;

        insert_post(&mut tx, opening).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn set_topic_state(
        &self,
        id: TopicId,
        is_locked: bool,
        is_pinned: bool,
    ) -> ForumResult<()> {
        sqlx::query("UPDATE forum_topics SET is_locked = $2, is_pinned = $3 WHERE topic_id = $1")
            .bind(id.as_uuid())
            .bind(is_locked)
            .bind(is_pinned)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

async fn insert_post(tx: &mut Transaction<'_, Postgres>, post: &Post) -> ForumResult<()> {
    sqlx::query(
        r#"
        INSERT INTO forum_posts (
            post_id,
            topic_id,
            author_id,
            body,
            is_opening,
            score,
            is_hidden,
            is_deleted,
            created_at,
            edited_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(post.id.as_uuid())
    .bind(post.topic_id.as_uuid())
    .bind(post.author_id.as_uuid())
    .bind(&post.body)
    .bind(post.is_opening)
    .bind(post.score)
    .bind(post.is_hidden)
    .bind(post.is_deleted)
    .bind(post.created_at)
    .bind(post.edited_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// ============================================================================
// Posts
// ============================================================================

impl PostRepository for PgForumStore {
    async fn list_posts(
        &self,
        topic_id: TopicId,
        page: PageRequest,
    ) -> ForumResult<(Vec<PostView>, i64)> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, {AUTHOR_COLUMNS} FROM forum_posts p \
             JOIN users u ON u.user_id = p.author_id \
             LEFT JOIN forum_members m ON m.user_id = u.user_id \
             WHERE p.topic_id = $1 AND NOT p.is_hidden AND NOT p.is_deleted \
             ORDER BY p.created_at ASC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PostViewRow>(&sql)
            .bind(topic_id.as_uuid())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM forum_posts \
             WHERE topic_id = $1 AND NOT is_hidden AND NOT is_deleted",
        )
        .bind(topic_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(PostViewRow::into_view)
            .collect::<ForumResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn find_post(&self, id: PostId) -> ForumResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM forum_posts p WHERE p.post_id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostRow::into_post))
    }

    async fn create_post(&self, post: &Post, quota: Option<DailyQuota>) -> ForumResult<()> {
        let mut tx = self.pool.begin().await?;
        enforce_quota(&mut tx, post.author_id, quota).await?;

        insert_post(&mut tx, post).await?;
        sqlx::query(
            "UPDATE forum_topics SET post_count = post_count + 1, last_post_at = $2 \
             WHERE topic_id = $1",
        )
        .bind(post.topic_id.as_uuid())
        .bind(post.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_post_body(
        &self,
        id: PostId,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> ForumResult<()> {
        sqlx::query("UPDATE forum_posts SET body = $2, edited_at = $3 WHERE post_id = $1")
            .bind(id.as_uuid())
            .bind(body)
            .bind(edited_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn soft_delete_post(&self, id: PostId) -> ForumResult<()> {
        let mut tx = self.pool.begin().await?;

        let topic_id = sqlx::query_scalar::<_, Uuid>(
            "UPDATE forum_posts SET is_deleted = TRUE \
             WHERE post_id = $1 AND NOT is_deleted RETURNING topic_id",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(topic_id) = topic_id {
            sqlx::query(
                "UPDATE forum_topics SET post_count = GREATEST(post_count - 1, 0) \
                 WHERE topic_id = $1",
            )
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Votes
// ============================================================================

impl VoteRepository for PgForumStore {
    async fn find_vote(&self, post_id: PostId, voter_id: UserId) -> ForumResult<i16> {
        let value = sqlx::query_scalar::<_, i16>(
            "SELECT value FROM forum_votes WHERE post_id = $1 AND voter_id = $2",
        )
        .bind(post_id.as_uuid())
        .bind(voter_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.unwrap_or(0))
    }

    async fn apply_vote(
        &self,
        post_id: PostId,
        voter_id: UserId,
        author_id: UserId,
        value: i16,
        quota: Option<DailyQuota>,
    ) -> ForumResult<VoteOutcome> {
        let mut tx = self.pool.begin().await?;
        enforce_quota(&mut tx, voter_id, quota).await?;

        // Row lock serialises concurrent re-votes by the same voter
        let previous = sqlx::query_scalar::<_, i16>(
            "SELECT value FROM forum_votes WHERE post_id = $1 AND voter_id = $2 FOR UPDATE",
        )
        .bind(post_id.as_uuid())
        .bind(voter_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0);

        let delta = reputation_delta(previous, value);

        if value == 0 {
            sqlx::query("DELETE FROM forum_votes WHERE post_id = $1 AND voter_id = $2")
                .bind(post_id.as_uuid())
                .bind(voter_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO forum_votes (post_id, voter_id, value, cast_at)
                VALUES ($1, $2, $3, now())
                ON CONFLICT (post_id, voter_id) DO UPDATE SET
                    value = EXCLUDED.value,
                    cast_at = EXCLUDED.cast_at
                "#,
            )
            .bind(post_id.as_uuid())
            .bind(voter_id.as_uuid())
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        let score = sqlx::query_scalar::<_, i32>(
            "UPDATE forum_posts SET score = score + $2 WHERE post_id = $1 RETURNING score",
        )
        .bind(post_id.as_uuid())
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        if delta != 0 {
            add_reputation(&mut tx, author_id.as_uuid(), delta).await?;
        }

        tx.commit().await?;

        Ok(VoteOutcome {
            score,
            value,
            reputation_delta: delta,
        })
    }
}

// ============================================================================
// Flags
// ============================================================================

impl FlagRepository for PgForumStore {
    async fn has_open_flag(&self, post_id: PostId, flagger_id: UserId) -> ForumResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM forum_flags \
             WHERE post_id = $1 AND flagger_id = $2 AND status = 'open')",
        )
        .bind(post_id.as_uuid())
        .bind(flagger_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_flag(&self, flag: &Flag, quota: Option<DailyQuota>) -> ForumResult<i64> {
        let mut tx = self.pool.begin().await?;
        enforce_quota(&mut tx, flag.flagger_id, quota).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO forum_flags (
                flag_id,
                post_id,
                flagger_id,
                reason,
                status,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(flag.id.as_uuid())
        .bind(flag.post_id.as_uuid())
        .bind(flag.flagger_id.as_uuid())
        .bind(&flag.reason)
        .bind(flag.status.code())
        .bind(flag.created_at)
        .execute(&mut *tx)
        .await;

        // Partial unique index: one open flag per flagger and post
        match inserted {
            Err(e) if is_unique_violation(&e) => {
                return Err(ForumError::Conflict(
                    "You have already flagged this post".to_string(),
                ));
            }
            other => other?,
        };

        let open = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM forum_flags WHERE post_id = $1 AND status = 'open'",
        )
        .bind(flag.post_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(open)
    }

    async fn find_flag(&self, id: FlagId) -> ForumResult<Option<Flag>> {
        let sql = format!("SELECT {FLAG_COLUMNS} FROM forum_flags f WHERE f.flag_id = $1");
        let row = sqlx::query_as::<_, FlagRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(FlagRow::into_flag).transpose()
    }

    async fn list_open_flags(&self, page: PageRequest) -> ForumResult<(Vec<FlagView>, i64)> {
        let sql = format!(
            "SELECT {FLAG_COLUMNS}, {AUTHOR_COLUMNS}, \
                 p.topic_id, \
                 LEFT(p.body, 200) AS post_excerpt, \
                 (SELECT COUNT(*) FROM forum_flags o \
                  WHERE o.post_id = f.post_id AND o.status = 'open') AS open_flags_on_post \
             FROM forum_flags f \
             JOIN forum_posts p ON p.post_id = f.post_id \
             JOIN users u ON u.user_id = f.flagger_id \
             LEFT JOIN forum_members m ON m.user_id = u.user_id \
             WHERE f.status = 'open' \
             ORDER BY f.created_at ASC \
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, FlagViewRow>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM forum_flags WHERE status = 'open'")
                .fetch_one(&self.pool)
                .await?;

        let items = rows
            .into_iter()
            .map(FlagViewRow::into_view)
            .collect::<ForumResult<Vec<_>>>()?;
        Ok((items, total))
    }
}

// ============================================================================
// Members
// ============================================================================

impl MemberRepository for PgForumStore {
    async fn find_standing(&self, user_id: UserId) -> ForumResult<Option<MemberStanding>> {
        let sql = format!(
            "SELECT {STANDING_COLUMNS} FROM users u \
             LEFT JOIN forum_members m ON m.user_id = u.user_id \
             WHERE u.user_id = $1"
        );
        let row = sqlx::query_as::<_, StandingRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(StandingRow::into_standing).transpose()
    }

    async fn find_standing_by_public_id(
        &self,
        public_id: &PublicId,
    ) -> ForumResult<Option<MemberStanding>> {
        self.fetch_standing("u.public_id", public_id.as_str()).await
    }

    async fn daily_activity(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> ForumResult<DailyActivity> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM forum_topics
                 WHERE author_id = $1 AND created_at >= $2) AS topics,
                (SELECT COUNT(*) FROM forum_posts
                 WHERE author_id = $1 AND NOT is_opening AND created_at >= $2) AS posts,
                (SELECT COUNT(*) FROM forum_votes
                 WHERE voter_id = $1 AND cast_at >= $2) AS votes,
                (SELECT COUNT(*) FROM forum_flags
                 WHERE flagger_id = $1 AND created_at >= $2) AS flags
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_activity())
    }
}

// ============================================================================
// Moderation log
// ============================================================================

impl ModerationLogRepository for PgForumStore {
    async fn apply_moderation(
        &self,
        change: &ModerationChange,
        entry: &ModerationEntry,
    ) -> ForumResult<Option<ModerationEntry>> {
        let mut tx = self.pool.begin().await?;
        let mut entry = entry.clone();

        let applied = match change {
            ModerationChange::HidePost {
                post_id,
                resolved_by,
            } => {
                let hidden = sqlx::query(
                    "UPDATE forum_posts SET is_hidden = TRUE \
                     WHERE post_id = $1 AND NOT is_hidden AND NOT is_deleted",
                )
                .bind(post_id.as_uuid())
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if hidden > 0 {
                    let resolved = sqlx::query(
                        "UPDATE forum_flags SET status = $2, resolved_by = $3, resolved_at = now() \
                         WHERE post_id = $1 AND status = 'open'",
                    )
                    .bind(post_id.as_uuid())
                    .bind(FlagStatus::Resolved.code())
                    .bind(resolved_by.map(UserId::into_uuid))
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                    entry.set_detail("flagsResolved", resolved);
                }
                hidden
            }
            ModerationChange::RestorePost { post_id } => sqlx::query(
                "UPDATE forum_posts SET is_hidden = FALSE WHERE post_id = $1 AND is_hidden",
            )
            .bind(post_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            ModerationChange::TopicState {
                topic_id,
                is_locked,
                is_pinned,
            } => sqlx::query(
                "UPDATE forum_topics SET is_locked = $2, is_pinned = $3 \
                 WHERE topic_id = $1 AND (is_locked <> $2 OR is_pinned <> $3)",
            )
            .bind(topic_id.as_uuid())
            .bind(is_locked)
            .bind(is_pinned)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            ModerationChange::Warn {
                user_id,
                penalty,
                at,
            } => sqlx::query(
                r#"
                INSERT INTO forum_members (user_id, reputation, last_warning_at, updated_at)
                VALUES ($1, $2, $3, now())
                ON CONFLICT (user_id) DO UPDATE SET
                    reputation = forum_members.reputation + EXCLUDED.reputation,
                    last_warning_at = EXCLUDED.last_warning_at,
                    updated_at = now()
                "#,
            )
            .bind(user_id.as_uuid())
            .bind(-penalty)
            .bind(at)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            ModerationChange::Ban {
                user_id,
                banned_at,
                until,
                reason,
            } => sqlx::query(
                r#"
                INSERT INTO forum_members (user_id, banned_at, banned_until, ban_reason, updated_at)
                VALUES ($1, $2, $3, $4, now())
                ON CONFLICT (user_id) DO UPDATE SET
                    banned_at = EXCLUDED.banned_at,
                    banned_until = EXCLUDED.banned_until,
                    ban_reason = EXCLUDED.ban_reason,
                    updated_at = now()
                "#,
            )
            .bind(user_id.as_uuid())
            .bind(banned_at)
            .bind(until)
            .bind(reason)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            ModerationChange::Unban { user_id } => sqlx::query(
                "UPDATE forum_members SET banned_at = NULL, banned_until = NULL, \
                 ban_reason = NULL, updated_at = now() \
                 WHERE user_id = $1 AND banned_at IS NOT NULL",
            )
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            ModerationChange::SetRole { user_id, from, to } => sqlx::query(
                "UPDATE users SET user_role = $3, updated_at = now() \
                 WHERE user_id = $1 AND user_role = $2",
            )
            .bind(user_id.as_uuid())
            .bind(from.id())
            .bind(to.id())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            ModerationChange::DismissFlag {
                flag_id,
                resolved_by,
            } => sqlx::query(
                "UPDATE forum_flags SET status = $2, resolved_by = $3, resolved_at = now() \
                 WHERE flag_id = $1 AND status = 'open'",
            )
            .bind(flag_id.as_uuid())
            .bind(FlagStatus::Dismissed.code())
            .bind(resolved_by.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
        };

        // Dropping the transaction rolls back
        if applied == 0 {
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO forum_moderation_log (
                entry_id,
                actor_id,
                action,
                target_kind,
                target_id,
                reason,
                details,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.actor_id.map(UserId::into_uuid))
        .bind(entry.action.code())
        .bind(entry.target_kind.code())
        .bind(entry.target_id)
        .bind(&entry.reason)
        .bind(&entry.details)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn list_entries(
        &self,
        page: PageRequest,
    ) -> ForumResult<(Vec<ModerationEntryView>, i64)> {
        let rows = sqlx::query_as::<_, ModerationRow>(
            r#"
            SELECT
                l.entry_id,
                l.actor_id,
                l.action,
                l.target_kind,
                l.target_id,
                l.reason,
                l.details,
                l.created_at,
                u.public_id AS actor_public_id,
                u.user_name AS actor_user_name,
                u.user_role AS actor_role,
                m.reputation AS actor_reputation
            FROM forum_moderation_log l
            LEFT JOIN users u ON u.user_id = l.actor_id
            LEFT JOIN forum_members m ON m.user_id = l.actor_id
            ORDER BY l.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM forum_moderation_log")
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(ModerationRow::into_view)
            .collect::<ForumResult<Vec<_>>>()?;
        Ok((items, total))
    }
}

// ============================================================================
// Row Types
// ============================================================================

fn parse_role(id: i16) -> ForumResult<UserRole> {
    UserRole::from_id(id).ok_or_else(|| ForumError::Internal(format!("Invalid user_role: {id}")))
}

fn parse_public_id(value: &str) -> ForumResult<PublicId> {
    PublicId::parse_str(value)
        .map_err(|e| ForumError::Internal(format!("Invalid public_id: {e}")))
}

#[derive(sqlx::FromRow)]
struct AuthorRow {
    author_public_id: String,
    author_user_name: String,
    author_role: i16,
    author_reputation: i32,
}

impl AuthorRow {
    fn into_summary(self) -> ForumResult<AuthorSummary> {
        Ok(AuthorSummary {
            public_id: parse_public_id(&self.author_public_id)?,
            user_name: self.author_user_name,
            role: parse_role(self.author_role)?,
            reputation: self.author_reputation,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    category_id: Uuid,
    slug: String,
    title: String,
    description: String,
    position: i32,
    min_role: i16,
    created_at: DateTime<Utc>,
    topic_count: i64,
}

impl CategoryRow {
    fn into_category(self) -> ForumResult<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(self.category_id),
            slug: self.slug,
            title: self.title,
            description: self.description,
            position: self.position,
            min_role: parse_role(self.min_role)?,
            topic_count: self.topic_count,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TopicRow {
    topic_id: Uuid,
    category_id: Uuid,
    author_id: Uuid,
    title: String,
    is_locked: bool,
    is_pinned: bool,
    post_count: i64,
    last_post_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TopicRow {
    fn into_topic(self) -> Topic {
        Topic {
            id: TopicId::from_uuid(self.topic_id),
            category_id: CategoryId::from_uuid(self.category_id),
            author_id: UserId::from_uuid(self.author_id),
            title: self.title,
            is_locked: self.is_locked,
            is_pinned: self.is_pinned,
            post_count: self.post_count,
            last_post_at: self.last_post_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TopicSummaryRow {
    #[sqlx(flatten)]
    topic: TopicRow,
    #[sqlx(flatten)]
    author: AuthorRow,
}

impl TopicSummaryRow {
    fn into_summary(self) -> ForumResult<TopicSummary> {
        Ok(TopicSummary {
            topic: self.topic.into_topic(),
            author: self.author.into_summary()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    post_id: Uuid,
    topic_id: Uuid,
    author_id: Uuid,
    body: String,
    is_opening: bool,
    score: i32,
    is_hidden: bool,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            id: PostId::from_uuid(self.post_id),
            topic_id: TopicId::from_uuid(self.topic_id),
            author_id: UserId::from_uuid(self.author_id),
            body: self.body,
            is_opening: self.is_opening,
            score: self.score,
            is_hidden: self.is_hidden,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            edited_at: self.edited_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostViewRow {
    #[sqlx(flatten)]
    post: PostRow,
    #[sqlx(flatten)]
    author: AuthorRow,
}

impl PostViewRow {
    fn into_view(self) -> ForumResult<PostView> {
        Ok(PostView {
            post: self.post.into_post(),
            author: self.author.into_summary()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FlagRow {
    flag_id: Uuid,
    post_id: Uuid,
    flagger_id: Uuid,
    reason: String,
    status: String,
    created_at: DateTime<Utc>,
    resolved_by: Option<Uuid>,
    resolved_at: Option<DateTime<Utc>>,
}

impl FlagRow {
    fn into_flag(self) -> ForumResult<Flag> {
        let status = FlagStatus::from_code(&self.status)
            .ok_or_else(|| ForumError::Internal(format!("Invalid flag status: {}", self.status)))?;

        Ok(Flag {
            id: FlagId::from_uuid(self.flag_id),
            post_id: PostId::from_uuid(self.post_id),
            flagger_id: UserId::from_uuid(self.flagger_id),
            reason: self.reason,
            status,
            created_at: self.created_at,
            resolved_by: self.resolved_by.map(UserId::from_uuid),
            resolved_at: self.resolved_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FlagViewRow {
    #[sqlx(flatten)]
    flag: FlagRow,
    #[sqlx(flatten)]
    flagger: AuthorRow,
    topic_id: Uuid,
    post_excerpt: String,
    open_flags_on_post: i64,
}

impl FlagViewRow {
    fn into_view(self) -> ForumResult<FlagView> {
        Ok(FlagView {
            flag: self.flag.into_flag()?,
            flagger: self.flagger.into_summary()?,
            topic_id: TopicId::from_uuid(self.topic_id),
            post_excerpt: self.post_excerpt,
            open_flags_on_post: self.open_flags_on_post,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StandingRow {
    user_id: Uuid,
    public_id: String,
    user_name: String,
    user_role: i16,
    joined_at: DateTime<Utc>,
    reputation: i32,
    last_warning_at: Option<DateTime<Utc>>,
    banned_at: Option<DateTime<Utc>>,
    banned_until: Option<DateTime<Utc>>,
    ban_reason: Option<String>,
    post_count: i64,
}

impl StandingRow {
    fn into_standing(self) -> ForumResult<MemberStanding> {
        Ok(MemberStanding {
            user_id: UserId::from_uuid(self.user_id),
            public_id: parse_public_id(&self.public_id)?,
            user_name: self.user_name,
            role: parse_role(self.user_role)?,
            reputation: self.reputation,
            post_count: self.post_count,
            joined_at: self.joined_at,
            last_warning_at: self.last_warning_at,
            banned_at: self.banned_at,
            banned_until: self.banned_until,
            ban_reason: self.ban_reason,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    topics: i64,
    posts: i64,
    votes: i64,
    flags: i64,
}

impl ActivityRow {
    fn into_activity(self) -> DailyActivity {
        let clamp = |n: i64| u32::try_from(n).unwrap_or(u32::MAX);
        DailyActivity {
            topics: clamp(self.topics),
            posts: clamp(self.posts),
            votes: clamp(self.votes),
            flags: clamp(self.flags),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ModerationRow {
    entry_id: Uuid,
    actor_id: Option<Uuid>,
    action: String,
    target_kind: String,
    target_id: Uuid,
    reason: Option<String>,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
    actor_public_id: Option<String>,
    actor_user_name: Option<String>,
    actor_role: Option<i16>,
    actor_reputation: Option<i32>,
}

impl ModerationRow {
    fn into_view(self) -> ForumResult<ModerationEntryView> {
        let action = ModerationAction::from_code(&self.action)
            .ok_or_else(|| ForumError::Internal(format!("Invalid action: {}", self.action)))?;
        let target_kind = TargetKind::from_code(&self.target_kind).ok_or_else(|| {
            ForumError::Internal(format!("Invalid target kind: {}", self.target_kind))
        })?;

        let actor = match (self.actor_public_id, self.actor_user_name, self.actor_role) {
            (Some(public_id), Some(user_name), Some(role)) => Some(AuthorSummary {
                public_id: parse_public_id(&public_id)?,
                user_name,
                role: parse_role(role)?,
                reputation: self.actor_reputation.unwrap_or(0),
            }),
            _ => None,
        };

        Ok(ModerationEntryView {
            entry: ModerationEntry {
                id: ModerationEntryId::from_uuid(self.entry_id),
                actor_id: self.actor_id.map(UserId::from_uuid),
                action,
                target_kind,
                target_id: self.target_id,
                reason: self.reason,
                details: self.details,
                created_at: self.created_at,
            },
            actor,
        })
    }
}
