//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use auth::{PublicId, UserId};
use chrono::{DateTime, Utc};
use kernel::id::{CategoryId, FlagId, PostId, TopicId};
use kernel::page::PageRequest;

use crate::domain::entities::{
    Category, DailyActivity, Flag, FlagView, MemberStanding, ModerationChange, ModerationEntry,
    ModerationEntryView, Post, PostView, Topic, TopicSummary, VoteOutcome,
};
use crate::domain::services::DailyQuota;
use crate::error::ForumResult;

#[trait_variant::make(CategoryRepository: Send)]
pub trait LocalCategoryRepository {
    /// All categories ordered by position
    async fn list_categories(&self) -> ForumResult<Vec<Category>>;

    async fn find_category(&self, id: CategoryId) -> ForumResult<Option<Category>>;

    async fn find_category_by_slug(&self, slug: &str) -> ForumResult<Option<Category>>;

    /// Duplicate slug is `ForumError::Conflict`
    async fn create_category(&self, category: &Category) -> ForumResult<()>;

    /// Duplicate slug is `ForumError::Conflict`
    async fn update_category(&self, category: &Category) -> ForumResult<()>;
}

#[trait_variant::make(TopicRepository: Send)]
pub trait LocalTopicRepository {
    /// Pinned first, then most recent activity
    async fn list_topics(
        &self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> ForumResult<(Vec<TopicSummary>, i64)>;

    async fn find_topic(&self, id: TopicId) -> ForumResult<Option<Topic>>;

    /// Insert the topic and its opening post together. A `quota` is checked
    /// against the author's topics under a per-member lock first.
    async fn create_topic(
        &self,
        topic: &Topic,
        opening: &Post,
        quota: Option<DailyQuota>,
    ) -> ForumResult<()>;

    async fn set_topic_state(&self, id: TopicId, is_locked: bool, is_pinned: bool)
    -> ForumResult<()>;
}

#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    /// Visible posts of a topic, oldest first
    async fn list_posts(
        &self,
        topic_id: TopicId,
        page: PageRequest,
    ) -> ForumResult<(Vec<PostView>, i64)>;

    async fn find_post(&self, id: PostId) -> ForumResult<Option<Post>>;

    /// Insert a reply and bump the topic's post count and activity time.
    /// A `quota` is checked against the author's replies under a per-member
    /// lock first.
    async fn create_post(&self, post: &Post, quota: Option<DailyQuota>) -> ForumResult<()>;

    async fn update_post_body(
        &self,
        id: PostId,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> ForumResult<()>;

    async fn soft_delete_post(&self, id: PostId) -> ForumResult<()>;
}

#[trait_variant::make(VoteRepository: Send)]
pub trait LocalVoteRepository {
    /// Current vote value, 0 when none
    async fn find_vote(&self, post_id: PostId, voter_id: UserId) -> ForumResult<i16>;

    /// Replace the voter's vote (0 removes it) and apply `new - old` to the
    /// post score and the author's reputation in one transaction, after
    /// checking `quota` against the voter's votes.
    async fn apply_vote(
        &self,
        post_id: PostId,
        voter_id: UserId,
        author_id: UserId,
        value: i16,
        quota: Option<DailyQuota>,
    ) -> ForumResult<VoteOutcome>;
}

#[trait_variant::make(FlagRepository: Send)]
pub trait LocalFlagRepository {
    async fn has_open_flag(&self, post_id: PostId, flagger_id: UserId) -> ForumResult<bool>;

    /// Insert and return the number of open flags now on the post, after
    /// checking `quota` against the flagger's flags.
    async fn create_flag(&self, flag: &Flag, quota: Option<DailyQuota>) -> ForumResult<i64>;

    async fn find_flag(&self, id: FlagId) -> ForumResult<Option<Flag>>;

    /// Open flags, oldest first
    async fn list_open_flags(&self, page: PageRequest) -> ForumResult<(Vec<FlagView>, i64)>;
}

#[trait_variant::make(MemberRepository: Send)]
pub trait LocalMemberRepository {
    async fn find_standing(&self, user_id: UserId) -> ForumResult<Option<MemberStanding>>;

    async fn find_standing_by_public_id(
        &self,
        public_id: &PublicId,
    ) -> ForumResult<Option<MemberStanding>>;

    /// Counters since `since`
    async fn daily_activity(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> ForumResult<DailyActivity>;
}

#[trait_variant::make(ModerationLogRepository: Send)]
pub trait LocalModerationLogRepository {
    /// Apply `change` and append `entry` in one transaction. Returns the
    /// entry as written, or `None` when the target was already in the
    /// requested state and nothing was written.
    async fn apply_moderation(
        &self,
        change: &ModerationChange,
        entry: &ModerationEntry,
    ) -> ForumResult<Option<ModerationEntry>>;

    /// Newest first
    async fn list_entries(
        &self,
        page: PageRequest,
    ) -> ForumResult<(Vec<ModerationEntryView>, i64)>;
}

/// Everything the forum use cases need from storage
pub trait ForumStore:
    CategoryRepository
    + TopicRepository
    + PostRepository
    + VoteRepository
    + FlagRepository
    + MemberRepository
    + ModerationLogRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> ForumStore for T where
    T: CategoryRepository
        + TopicRepository
        + PostRepository
        + VoteRepository
        + FlagRepository
        + MemberRepository
        + ModerationLogRepository
        + Send
        + Sync
        + 'static
{
}
