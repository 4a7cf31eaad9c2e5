//! Use case and router tests against an in-memory store

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use auth::domain::repository::{AuthSessionRepository, UserRepository};
use auth::domain::{AuthSession, Credential, User};
use auth::{AuthConfig, AuthMiddlewareState, AuthResult, PublicId, UserId, UserName, UserRole};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Duration, Utc};
use kernel::id::{CategoryId, FlagId, PostId, TopicId};
use kernel::page::PageRequest;
use tower::ServiceExt;
use uuid::Uuid;

use crate::application::{
    BrowseUseCase, CategoryInput, CategoryUseCase, FlagUseCase, ModerationUseCase,
    NewTopicInput, PostingUseCase, TopicSwitch, VoteUseCase,
};
use crate::domain::entities::{
    Actor, Category, DailyActivity, Flag, FlagStatus, FlagView, MemberStanding, ModerationAction,
    ModerationChange, ModerationEntry, ModerationEntryView, Post, PostView, TargetKind, Topic,
    TopicSummary, VoteOutcome,
};
use crate::domain::repository::{
    CategoryRepository, FlagRepository, MemberRepository, ModerationLogRepository,
    PostRepository, TopicRepository, VoteRepository,
};
use crate::domain::role_tier::{LimitedAction, Permission};
use crate::domain::services::{DailyQuota, daily_quota};
use crate::error::{ForumError, ForumResult};
use crate::presentation::router::forum_router_generic;
use crate::ForumConfig;

#[derive(Default)]
struct MemoryData {
    members: HashMap<UserId, MemberStanding>,
    categories: Vec<Category>,
    topics: Vec<Topic>,
    posts: Vec<Post>,
    votes: HashMap<(PostId, UserId), (i16, DateTime<Utc>)>,
    flags: Vec<Flag>,
    log: Vec<ModerationEntry>,
}

impl MemoryData {
    fn standing(&self, user_id: UserId) -> Option<MemberStanding> {
        let mut standing = self.members.get(&user_id)?.clone();
        standing.post_count = self
            .posts
            .iter()
            .filter(|p| p.author_id == user_id && p.is_visible())
            .count() as i64;
        Some(standing)
    }

    fn author(&self, user_id: UserId) -> ForumResult<crate::domain::entities::AuthorSummary> {
        self.standing(user_id)
            .map(|s| s.summary())
            .ok_or(ForumError::NotFound("Member"))
    }

    fn with_topic_count(&self, category: &Category) -> Category {
        let mut category = category.clone();
        category.topic_count = self
            .topics
            .iter()
            .filter(|t| t.category_id == category.id)
            .count() as i64;
        category
    }

    fn activity(&self, user_id: UserId, since: DateTime<Utc>) -> DailyActivity {
        DailyActivity {
            topics: self
                .topics
                .iter()
                .filter(|t| t.author_id == user_id && t.created_at >= since)
                .count() as u32,
            posts: self
                .posts
                .iter()
                .filter(|p| p.author_id == user_id && !p.is_opening && p.created_at >= since)
                .count() as u32,
            votes: self
                .votes
                .iter()
                .filter(|((_, voter), (_, cast_at))| *voter == user_id && *cast_at >= since)
                .count() as u32,
            flags: self
                .flags
                .iter()
                .filter(|f| f.flagger_id == user_id && f.created_at >= since)
                .count() as u32,
        }
    }

    /// Runs under the store mutex, so count and insert cannot interleave
    fn admit(&self, user_id: UserId, quota: Option<DailyQuota>) -> ForumResult<()> {
        match quota {
            Some(quota) => quota.admit(self.activity(user_id, quota.since).get(quota.action)),
            None => Ok(()),
        }
    }

    fn resolve_open_flags(&mut self, post_id: PostId, resolved_by: Option<UserId>) -> u64 {
        let mut resolved = 0;
        for flag in self
            .flags
            .iter_mut()
            .filter(|f| f.post_id == post_id && f.status == FlagStatus::Open)
        {
            flag.status = FlagStatus::Resolved;
            flag.resolved_by = resolved_by;
            flag.resolved_at = Some(Utc::now());
            resolved += 1;
        }
        resolved
    }

    /// Whether `change` altered anything
    fn apply(&mut self, change: &ModerationChange, entry: &mut ModerationEntry) -> bool {
        match *change {
            ModerationChange::HidePost {
                post_id,
                resolved_by,
            } => {
                let Some(post) = self
                    .posts
                    .iter_mut()
                    .find(|p| p.id == post_id && !p.is_hidden && !p.is_deleted)
                else {
                    return false;
                };
                post.is_hidden = true;
                let resolved = self.resolve_open_flags(post_id, resolved_by);
                entry.set_detail("flagsResolved", resolved);
                true
            }
            ModerationChange::RestorePost { post_id } => {
                match self.posts.iter_mut().find(|p| p.id == post_id && p.is_hidden) {
                    Some(post) => {
                        post.is_hidden = false;
                        true
                    }
                    None => false,
                }
            }
            ModerationChange::TopicState {
                topic_id,
                is_locked,
                is_pinned,
            } => match self.topics.iter_mut().find(|t| {
                t.id == topic_id && (t.is_locked != is_locked || t.is_pinned != is_pinned)
            }) {
                Some(topic) => {
                    topic.is_locked = is_locked;
                    topic.is_pinned = is_pinned;
                    true
                }
                None => false,
            },
            ModerationChange::Warn {
                user_id,
                penalty,
                at,
            } => match self.members.get_mut(&user_id) {
                Some(member) => {
                    member.reputation -= penalty;
                    member.last_warning_at = Some(at);
                    true
                }
                None => false,
            },
            ModerationChange::Ban {
                user_id,
                banned_at,
                until,
                ref reason,
            } => match self.members.get_mut(&user_id) {
                Some(member) => {
                    member.banned_at = Some(banned_at);
                    member.banned_until = until;
                    member.ban_reason = reason.clone();
                    true
                }
                None => false,
            },
            ModerationChange::Unban { user_id } => {
                match self.members.get_mut(&user_id).filter(|m| m.banned_at.is_some()) {
                    Some(member) => {
                        member.banned_at = None;
                        member.banned_until = None;
                        member.ban_reason = None;
                        true
                    }
                    None => false,
                }
            }
            ModerationChange::SetRole { user_id, from, to } => {
                match self.members.get_mut(&user_id).filter(|m| m.role == from) {
                    Some(member) => {
                        member.role = to;
                        true
                    }
                    None => false,
                }
            }
            ModerationChange::DismissFlag {
                flag_id,
                resolved_by,
            } => match self
                .flags
                .iter_mut()
                .find(|f| f.id == flag_id && f.status == FlagStatus::Open)
            {
                Some(flag) => {
                    flag.status = FlagStatus::Dismissed;
                    flag.resolved_by = Some(resolved_by);
                    flag.resolved_at = Some(Utc::now());
                    true
                }
                None => false,
            },
        }
    }

    fn open_flags_on(&self, post_id: PostId) -> i64 {
        self.flags
            .iter()
            .filter(|f| f.post_id == post_id && f.status == FlagStatus::Open)
            .count() as i64
    }
}

fn paged<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (items, total)
}

#[derive(Clone, Default)]
struct MemoryForumStore {
    inner: Arc<Mutex<MemoryData>>,
}

impl MemoryForumStore {
    fn add_member(&self, role: UserRole, age_days: i64) -> Actor {
        let user_id = UserId::new();
        let standing = MemberStanding {
            user_id,
            public_id: PublicId::new(),
            user_name: format!("member-{}", &user_id.to_string()[..8]),
            role,
            reputation: 0,
            post_count: 0,
            joined_at: Utc::now() - Duration::days(age_days),
            last_warning_at: None,
            banned_at: None,
            banned_until: None,
            ban_reason: None,
        };
        self.inner.lock().unwrap().members.insert(user_id, standing);
        Actor { user_id, role }
    }

    fn public_id(&self, actor: &Actor) -> PublicId {
        self.inner.lock().unwrap().members[&actor.user_id].public_id
    }

    fn member(&self, actor: &Actor) -> MemberStanding {
        self.inner.lock().unwrap().standing(actor.user_id).unwrap()
    }

    fn add_category(&self, slug: &str, min_role: UserRole) -> Category {
        let category = Category {
            id: CategoryId::new(),
            slug: slug.to_string(),
            title: slug.to_string(),
            description: String::new(),
            position: 0,
            min_role,
            topic_count: 0,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().categories.push(category.clone());
        category
    }

    fn post(&self, id: PostId) -> Post {
        let data = self.inner.lock().unwrap();
        data.posts.iter().find(|p| p.id == id).cloned().unwrap()
    }

    fn backdate_post(&self, id: PostId, hours: i64) {
        let mut data = self.inner.lock().unwrap();
        let post = data.posts.iter_mut().find(|p| p.id == id).unwrap();
        post.created_at -= Duration::hours(hours);
    }

    fn log_actions(&self) -> Vec<(ModerationAction, Option<UserId>)> {
        let data = self.inner.lock().unwrap();
        data.log.iter().map(|e| (e.action, e.actor_id)).collect()
    }
}

impl CategoryRepository for MemoryForumStore {
    async fn list_categories(&self) -> ForumResult<Vec<Category>> {
        let data = self.inner.lock().unwrap();
        let mut categories: Vec<_> = data
            .categories
            .iter()
            .map(|c| data.with_topic_count(c))
            .collect();
        categories.sort_by_key(|c| c.position);
        Ok(categories)
    }

    async fn find_category(&self, id: CategoryId) -> ForumResult<Option<Category>> {
        let data = self.inner.lock().unwrap();
        Ok(data
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| data.with_topic_count(c)))
    }

    async fn find_category_by_slug(&self, slug: &str) -> ForumResult<Option<Category>> {
        let data = self.inner.lock().unwrap();
        Ok(data
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| data.with_topic_count(c)))
    }

    async fn create_category(&self, category: &Category) -> ForumResult<()> {
        let mut data = self.inner.lock().unwrap();
        if data.categories.iter().any(|c| c.slug == category.slug) {
            return Err(ForumError::Conflict("Category slug is taken".to_string()));
        }
        data.categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> ForumResult<()> {
        let mut data = self.inner.lock().unwrap();
        if data
            .categories
            .iter()
            .any(|c| c.slug == category.slug && c.id != category.id)
        {
            return Err(ForumError::Conflict("Category slug is taken".to_string()));
        }
        if let Some(existing) = data.categories.iter_mut().find(|c| c.id == category.id) {
            *existing = category.clone();
        }
        Ok(())
    }
}

impl TopicRepository for MemoryForumStore {
    async fn list_topics(
        &self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> ForumResult<(Vec<TopicSummary>, i64)> {
        let data = self.inner.lock().unwrap();
        let mut topics: Vec<_> = data
            .topics
            .iter()
            .filter(|t| t.category_id == category_id)
            .cloned()
            .collect();
        topics.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.last_post_at.cmp(&a.last_post_at))
        });
        let summaries = topics
            .into_iter()
            .map(|topic| {
                let author = data.author(topic.author_id)?;
                Ok(TopicSummary { topic, author })
            })
            .collect::<ForumResult<Vec<_>>>()?;
        Ok(paged(summaries, page))
    }

    async fn find_topic(&self, id: TopicId) -> ForumResult<Option<Topic>> {
        let data = self.inner.lock().unwrap();
        Ok(data.topics.iter().find(|t| t.id == id).cloned())
    }

    async fn create_topic(
        &self,
        topic: &Topic,
        opening: &Post,
        quota: Option<DailyQuota>,
    ) -> ForumResult<()> {
        let mut data = self.inner.lock().unwrap();
        data.admit(topic.author_id, quota)?;
        data.topics.push(topic.clone());
        data.posts.push(opening.clone());
        Ok(())
    }

    async fn set_topic_state(
        &self,
        id: TopicId,
        is_locked: bool,
        is_pinned: bool,
    ) -> ForumResult<()> {
        let mut data = self.inner.lock().unwrap();
        if let Some(topic) = data.topics.iter_mut().find(|t| t.id == id) {
            topic.is_locked = is_locked;
            topic.is_pinned = is_pinned;
        }
        Ok(())
    }
}

impl PostRepository for MemoryForumStore {
    async fn list_posts(
        &self,
        topic_id: TopicId,
        page: PageRequest,
    ) -> ForumResult<(Vec<PostView>, i64)> {
        let data = self.inner.lock().unwrap();
        let mut posts: Vec<_> = data
            .posts
            .iter()
            .filter(|p| p.topic_id == topic_id && p.is_visible())
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.created_at);
        let views = posts
            .into_iter()
            .map(|post| {
                let author = data.author(post.author_id)?;
                Ok(PostView { post, author })
            })
            .collect::<ForumResult<Vec<_>>>()?;
        Ok(paged(views, page))
    }

    async fn find_post(&self, id: PostId) -> ForumResult<Option<Post>> {
        let data = self.inner.lock().unwrap();
        Ok(data.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, post: &Post, quota: Option<DailyQuota>) -> ForumResult<()> {
        let mut data = self.inner.lock().unwrap();
        data.admit(post.author_id, quota)?;
        let topic = data
            .topics
            .iter_mut()
            .find(|t| t.id == post.topic_id)
            .ok_or(ForumError::NotFound("Topic"))?;
        topic.post_count += 1;
        topic.last_post_at = post.created_at;
        data.posts.push(post.clone());
        Ok(())
    }

    async fn update_post_body(
        &self,
        id: PostId,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> ForumResult<()> {
        let mut data = self.inner.lock().unwrap();
        if let Some(post) = data.posts.iter_mut().find(|p| p.id == id) {
            post.body = body.to_string();
            post.edited_at = Some(edited_at);
        }
        Ok(())
    }

    async fn soft_delete_post(&self, id: PostId) -> ForumResult<()> {
        let mut data = self.inner.lock().unwrap();
        let Some(post) = data.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(());
        };
        post.is_deleted = true;
        let topic_id = post.topic_id;
        if let Some(topic) = data.topics.iter_mut().find(|t| t.id == topic_id) {
            topic.post_count = (topic.post_count - 1).max(0);
        }
        Ok(())
    }
}

impl VoteRepository for MemoryForumStore {
    async fn find_vote(&self, post_id: PostId, voter_id: UserId) -> ForumResult<i16> {
        let data = self.inner.lock().unwrap();
        Ok(data
            .votes
            .get(&(post_id, voter_id))
            .map(|(value, _)| *value)
            .unwrap_or(0))
    }

    async fn apply_vote(
        &self,
        post_id: PostId,
        voter_id: UserId,
        author_id: UserId,
        value: i16,
        quota: Option<DailyQuota>,
    ) -> ForumResult<VoteOutcome> {
        let mut data = self.inner.lock().unwrap();
        data.admit(voter_id, quota)?;
        let old = if value == 0 {
            data.votes.remove(&(post_id, voter_id))
        } else {
            data.votes.insert((post_id, voter_id), (value, Utc::now()))
        }
        .map(|(v, _)| v)
        .unwrap_or(0);
        let delta = i32::from(value) - i32::from(old);

        let post = data
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(ForumError::NotFound("Post"))?;
        post.score += delta;
        let score = post.score;

        if let Some(author) = data.members.get_mut(&author_id) {
            author.reputation += delta;
        }

        Ok(VoteOutcome {
            score,
            value,
            reputation_delta: delta,
        })
    }
}

impl FlagRepository for MemoryForumStore {
    async fn has_open_flag(&self, post_id: PostId, flagger_id: UserId) -> ForumResult<bool> {
        let data = self.inner.lock().unwrap();
        Ok(data.flags.iter().any(|f| {
            f.post_id == post_id && f.flagger_id == flagger_id && f.status == FlagStatus::Open
        }))
    }

    async fn create_flag(&self, flag: &Flag, quota: Option<DailyQuota>) -> ForumResult<i64> {
        let mut data = self.inner.lock().unwrap();
        data.admit(flag.flagger_id, quota)?;
        data.flags.push(flag.clone());
        Ok(data.open_flags_on(flag.post_id))
    }

    async fn find_flag(&self, id: FlagId) -> ForumResult<Option<Flag>> {
        let data = self.inner.lock().unwrap();
        Ok(data.flags.iter().find(|f| f.id == id).cloned())
    }

    async fn list_open_flags(&self, page: PageRequest) -> ForumResult<(Vec<FlagView>, i64)> {
        let data = self.inner.lock().unwrap();
        let views = data
            .flags
            .iter()
            .filter(|f| f.status == FlagStatus::Open)
            .map(|flag| {
                let post = data
                    .posts
                    .iter()
                    .find(|p| p.id == flag.post_id)
                    .ok_or(ForumError::NotFound("Post"))?;
                Ok(FlagView {
                    flag: flag.clone(),
                    flagger: data.author(flag.flagger_id)?,
                    topic_id: post.topic_id,
                    post_excerpt: post.body.chars().take(200).collect(),
                    open_flags_on_post: data.open_flags_on(flag.post_id),
                })
            })
            .collect::<ForumResult<Vec<_>>>()?;
        Ok(paged(views, page))
    }
}

impl MemberRepository for MemoryForumStore {
    async fn find_standing(&self, user_id: UserId) -> ForumResult<Option<MemberStanding>> {
        Ok(self.inner.lock().unwrap().standing(user_id))
    }

    async fn find_standing_by_public_id(
        &self,
        public_id: &PublicId,
    ) -> ForumResult<Option<MemberStanding>> {
        let data = self.inner.lock().unwrap();
        Ok(data
            .members
            .values()
            .find(|m| &m.public_id == public_id)
            .and_then(|m| data.standing(m.user_id)))
    }

    async fn daily_activity(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> ForumResult<DailyActivity> {
        Ok(self.inner.lock().unwrap().activity(user_id, since))
    }
}

impl ModerationLogRepository for MemoryForumStore {
    async fn apply_moderation(
        &self,
        change: &ModerationChange,
        entry: &ModerationEntry,
    ) -> ForumResult<Option<ModerationEntry>> {
        let mut data = self.inner.lock().unwrap();
        let mut entry = entry.clone();
        if !data.apply(change, &mut entry) {
            return Ok(None);
        }
        data.log.push(entry.clone());
        Ok(Some(entry))
    }

    async fn list_entries(
        &self,
        page: PageRequest,
    ) -> ForumResult<(Vec<ModerationEntryView>, i64)> {
        let data = self.inner.lock().unwrap();
        let views: Vec<_> = data
            .log
            .iter()
            .rev()
            .map(|entry| ModerationEntryView {
                entry: entry.clone(),
                actor: entry.actor_id.and_then(|id| data.standing(id)).map(|s| s.summary()),
            })
            .collect();
        Ok(paged(views, page))
    }
}

fn setup() -> (Arc<MemoryForumStore>, Arc<ForumConfig>, Category) {
    let store = Arc::new(MemoryForumStore::default());
    let category = store.add_category("general", UserRole::Newcomer);
    (store, Arc::new(ForumConfig::default()), category)
}

/// Actor as the use cases see it after a role change
fn refreshed(store: &MemoryForumStore, actor: &Actor) -> Actor {
    Actor {
        user_id: actor.user_id,
        role: store.member(actor).role,
    }
}

async fn start_topic(store: &Arc<MemoryForumStore>, actor: &Actor, category: &Category) -> (Topic, PostId) {
    let topic = PostingUseCase::new(store.clone())
        .create_topic(
            actor,
            NewTopicInput {
                category_id: category.id,
                title: "Where to start".to_string(),
                body: "First post of the topic".to_string(),
            },
        )
        .await
        .unwrap();
    let opening = {
        let data = store.inner.lock().unwrap();
        data.posts
            .iter()
            .find(|p| p.topic_id == topic.id && p.is_opening)
            .map(|p| p.id)
            .unwrap()
    };
    (topic, opening)
}

#[tokio::test]
async fn test_newcomer_topic_limit_and_no_voting() {
    let (store, _, category) = setup();
    let newcomer = store.add_member(UserRole::Newcomer, 0);
    let member = store.add_member(UserRole::Member, 30);
    let posting = PostingUseCase::new(store.clone());

    start_topic(&store, &newcomer, &category).await;
    start_topic(&store, &newcomer, &category).await;

    let third = posting
        .create_topic(
            &newcomer,
            NewTopicInput {
                category_id: category.id,
                title: "One more topic".to_string(),
                body: "Over the limit".to_string(),
            },
        )
        .await;
    match third {
        Err(e @ ForumError::DailyLimitReached { limit: 2, .. }) => {
            assert_eq!(e.status_code(), StatusCode::TOO_MANY_REQUESTS);
        }
        other => panic!("expected daily limit, got {other:?}"),
    }

    let (_, post_id) = start_topic(&store, &member, &category).await;
    let vote = VoteUseCase::new(store.clone()).execute(&newcomer, post_id, 1).await;
    match vote {
        Err(e @ ForumError::PermissionDenied(Permission::Vote)) => {
            assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
        }
        other => panic!("expected permission denied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_votes_move_score_and_reputation() {
    let (store, _, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let voter = store.add_member(UserRole::Member, 30);
    let (_, post_id) = start_topic(&store, &author, &category).await;
    let voting = VoteUseCase::new(store.clone());

    let outcome = voting.execute(&voter, post_id, 1).await.unwrap();
    assert_eq!((outcome.score, outcome.reputation_delta), (1, 1));
    assert_eq!(store.member(&author).reputation, 1);

    // Same value again changes nothing
    let outcome = voting.execute(&voter, post_id, 1).await.unwrap();
    assert_eq!((outcome.score, outcome.reputation_delta), (1, 0));

    let outcome = voting.execute(&voter, post_id, -1).await.unwrap();
    assert_eq!((outcome.score, outcome.reputation_delta), (-1, -2));
    assert_eq!(store.member(&author).reputation, -1);

    let outcome = voting.execute(&voter, post_id, 0).await.unwrap();
    assert_eq!((outcome.score, outcome.value), (0, 0));
    assert_eq!(store.member(&author).reputation, 0);
    assert_eq!(store.post(post_id).score, 0);

    assert!(matches!(
        voting.execute(&voter, post_id, 2).await,
        Err(ForumError::Validation(_))
    ));
    assert!(matches!(
        voting.execute(&author, post_id, 1).await,
        Err(ForumError::OwnPost(_))
    ));
}

#[tokio::test]
async fn test_votes_promote_author_automatically() {
    let (store, _, category) = setup();
    let newcomer = store.add_member(UserRole::Newcomer, 2);
    let (topic, post_id) = start_topic(&store, &newcomer, &category).await;
    let posting = PostingUseCase::new(store.clone());
    posting.reply(&newcomer, topic.id, "Second post").await.unwrap();
    posting.reply(&newcomer, topic.id, "Third post").await.unwrap();
    assert_eq!(store.member(&newcomer).post_count, 3);

    let voting = VoteUseCase::new(store.clone());
    for _ in 0..4 {
        let voter = store.add_member(UserRole::Member, 30);
        voting.execute(&voter, post_id, 1).await.unwrap();
    }
    assert_eq!(store.member(&newcomer).role, UserRole::Newcomer);

    let voter = store.add_member(UserRole::Member, 30);
    voting.execute(&voter, post_id, 1).await.unwrap();

    let standing = store.member(&newcomer);
    assert_eq!(standing.role, UserRole::Member);
    assert_eq!(standing.reputation, 5);
    assert_eq!(
        store.log_actions(),
        vec![(ModerationAction::AutoPromote, None)]
    );
}

#[tokio::test]
async fn test_young_account_is_not_promoted() {
    let (store, _, category) = setup();
    let newcomer = store.add_member(UserRole::Newcomer, 0);
    let (topic, post_id) = start_topic(&store, &newcomer, &category).await;
    let posting = PostingUseCase::new(store.clone());
    posting.reply(&newcomer, topic.id, "Second post").await.unwrap();
    posting.reply(&newcomer, topic.id, "Third post").await.unwrap();

    let voting = VoteUseCase::new(store.clone());
    for _ in 0..6 {
        let voter = store.add_member(UserRole::Member, 30);
        voting.execute(&voter, post_id, 1).await.unwrap();
    }

    assert_eq!(store.member(&newcomer).role, UserRole::Newcomer);
    assert!(store.log_actions().is_empty());
}

#[tokio::test]
async fn test_locked_topic_rejects_replies_except_moderators() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (topic, _) = start_topic(&store, &author, &category).await;

    let locked = ModerationUseCase::new(store.clone(), config)
        .switch_topic(&moderator, topic.id, TopicSwitch::Lock, Some("Off topic"))
        .await
        .unwrap();
    assert!(locked.is_locked);

    let posting = PostingUseCase::new(store.clone());
    match posting.reply(&author, topic.id, "Still here").await {
        Err(e @ ForumError::TopicLocked) => assert_eq!(e.status_code(), StatusCode::LOCKED),
        other => panic!("expected locked topic, got {other:?}"),
    }
    posting
        .reply(&moderator, topic.id, "Closing note")
        .await
        .unwrap();

    assert_eq!(
        store.log_actions(),
        vec![(ModerationAction::LockTopic, Some(moderator.user_id))]
    );
}

#[tokio::test]
async fn test_close_own_topic_needs_active_role() {
    let (store, _, category) = setup();
    let member = store.add_member(UserRole::Member, 30);
    let active = store.add_member(UserRole::Active, 90);
    let posting = PostingUseCase::new(store.clone());

    let (topic, _) = start_topic(&store, &member, &category).await;
    assert!(matches!(
        posting.close_topic(&member, topic.id).await,
        Err(ForumError::PermissionDenied(Permission::CloseOwnTopic))
    ));

    let (topic, _) = start_topic(&store, &active, &category).await;
    let closed = posting.close_topic(&active, topic.id).await.unwrap();
    assert!(closed.is_locked);
    assert!(matches!(
        posting.reply(&member, topic.id, "Too late").await,
        Err(ForumError::TopicLocked)
    ));
    assert!(matches!(
        posting.close_topic(&active, topic.id).await,
        Err(ForumError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_edit_window_and_authorship() {
    let (store, _, category) = setup();
    let author = store.add_member(UserRole::Newcomer, 3);
    let other = store.add_member(UserRole::Member, 30);
    let posting = PostingUseCase::new(store.clone());
    let (_, post_id) = start_topic(&store, &author, &category).await;

    let edited = posting.edit_post(&author, post_id, "Fixed typo").await.unwrap();
    assert_eq!(edited.body, "Fixed typo");
    assert!(edited.edited_at.is_some());

    assert!(matches!(
        posting.edit_post(&other, post_id, "Not mine").await,
        Err(ForumError::NotAuthor)
    ));

    store.backdate_post(post_id, 25);
    assert!(matches!(
        posting.edit_post(&author, post_id, "Too late").await,
        Err(ForumError::EditWindowClosed)
    ));
}

#[tokio::test]
async fn test_delete_own_post_hides_it_from_topic() {
    let (store, _, category) = setup();
    let member = store.add_member(UserRole::Member, 30);
    let posting = PostingUseCase::new(store.clone());
    let (topic, _) = start_topic(&store, &member, &category).await;
    let reply = posting.reply(&member, topic.id, "Never mind").await.unwrap();

    posting.delete_post(&member, reply.id).await.unwrap();

    let detail = BrowseUseCase::new(store.clone())
        .topic(topic.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(detail.posts.total, 1);
    assert_eq!(detail.topic.post_count, 1);
    assert!(matches!(
        posting.delete_post(&member, reply.id).await,
        Err(ForumError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_category_min_role() {
    let (store, _, _) = setup();
    let staff = store.add_category("announcements", UserRole::Member);
    let newcomer = store.add_member(UserRole::Newcomer, 5);
    let member = store.add_member(UserRole::Member, 30);
    let posting = PostingUseCase::new(store.clone());

    let input = |category: &Category| NewTopicInput {
        category_id: category.id,
        title: "Release notes".to_string(),
        body: "Version two is out".to_string(),
    };
    assert!(matches!(
        posting.create_topic(&newcomer, input(&staff)).await,
        Err(ForumError::PermissionDenied(Permission::CreateTopic))
    ));
    posting.create_topic(&member, input(&staff)).await.unwrap();

    let (category, page) = BrowseUseCase::new(store.clone())
        .topics("announcements", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(category.topic_count, 1);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_three_flags_hide_post() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let (topic, post_id) = start_topic(&store, &author, &category).await;
    let flagging = FlagUseCase::new(store.clone(), config);

    let first = store.add_member(UserRole::Member, 30);
    let outcome = flagging.execute(&first, post_id, "Spam link").await.unwrap();
    assert_eq!(outcome.open_flags, 1);
    assert!(!outcome.auto_hidden);
    assert!(matches!(
        flagging.execute(&first, post_id, "Spam again").await,
        Err(ForumError::Conflict(_))
    ));

    let second = store.add_member(UserRole::Member, 30);
    flagging.execute(&second, post_id, "Spam link").await.unwrap();
    let third = store.add_member(UserRole::Active, 90);
    let outcome = flagging.execute(&third, post_id, "Spam link").await.unwrap();
    assert!(outcome.auto_hidden);

    assert!(store.post(post_id).is_hidden);
    assert_eq!(
        store.log_actions(),
        vec![(ModerationAction::AutoHidePost, None)]
    );
    {
        let data = store.inner.lock().unwrap();
        assert!(data.flags.iter().all(|f| f.status == FlagStatus::Resolved));
    }

    let detail = BrowseUseCase::new(store.clone())
        .topic(topic.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(detail.posts.total, 0);

    let late = store.add_member(UserRole::Member, 30);
    assert!(matches!(
        flagging.execute(&late, post_id, "Spam link").await,
        Err(ForumError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_flag_queue_and_dismissal() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let flagger = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (_, post_id) = start_topic(&store, &author, &category).await;

    let outcome = FlagUseCase::new(store.clone(), config.clone())
        .execute(&flagger, post_id, "Rude reply")
        .await
        .unwrap();

    let moderation = ModerationUseCase::new(store.clone(), config);
    let queue = moderation
        .list_flags(&moderator, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(queue.total, 1);
    assert_eq!(queue.items[0].open_flags_on_post, 1);

    moderation
        .dismiss_flag(&moderator, outcome.flag.id, None)
        .await
        .unwrap();
    assert!(matches!(
        moderation.dismiss_flag(&moderator, outcome.flag.id, None).await,
        Err(ForumError::Conflict(_))
    ));
    assert!(matches!(
        moderation.list_flags(&flagger, PageRequest::default()).await,
        Err(ForumError::PermissionDenied(Permission::ReviewFlags))
    ));
}

#[tokio::test]
async fn test_hide_and_restore_respect_rank() {
    let (store, config, category) = setup();
    let trusted = store.add_member(UserRole::Trusted, 200);
    let moderator = store.add_member(UserRole::Moderator, 200);
    let other_moderator = store.add_member(UserRole::Moderator, 200);
    let admin = store.add_member(UserRole::Admin, 365);
    let moderation = ModerationUseCase::new(store.clone(), config);

    let (_, trusted_post) = start_topic(&store, &trusted, &category).await;
    moderation
        .hide_post(&moderator, trusted_post, Some("Off topic"))
        .await
        .unwrap();
    assert!(store.post(trusted_post).is_hidden);
    moderation
        .restore_post(&moderator, trusted_post, None)
        .await
        .unwrap();
    assert!(!store.post(trusted_post).is_hidden);

    let (_, moderator_post) = start_topic(&store, &other_moderator, &category).await;
    match moderation.hide_post(&moderator, moderator_post, None).await {
        Err(e @ ForumError::Outranked) => assert_eq!(e.status_code(), StatusCode::FORBIDDEN),
        other => panic!("expected outranked, got {other:?}"),
    }
    moderation
        .hide_post(&admin, moderator_post, None)
        .await
        .unwrap();

    assert!(matches!(
        moderation.hide_post(&moderator, trusted_post, Some("no")).await,
        Err(ForumError::Validation(_))
    ));
}

#[tokio::test]
async fn test_warning_costs_reputation() {
    let (store, config, _) = setup();
    let member = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let moderation = ModerationUseCase::new(store.clone(), config);
    let public_id = store.public_id(&member);

    assert!(matches!(
        moderation.warn_member(&moderator, &public_id, "").await,
        Err(ForumError::Validation(_))
    ));
    moderation
        .warn_member(&moderator, &public_id, "Keep it civil")
        .await
        .unwrap();

    let standing = store.member(&member);
    assert_eq!(standing.reputation, -5);
    assert!(standing.last_warning_at.is_some());
    assert_eq!(
        store.log_actions(),
        vec![(ModerationAction::WarnMember, Some(moderator.user_id))]
    );

    let own_id = store.public_id(&moderator);
    assert!(matches!(
        moderation.warn_member(&moderator, &own_id, "Self warning").await,
        Err(ForumError::SelfAction)
    ));
}

#[tokio::test]
async fn test_ban_blocks_posting_until_lifted() {
    let (store, config, category) = setup();
    let member = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (topic, _) = start_topic(&store, &moderator, &category).await;
    let moderation = ModerationUseCase::new(store.clone(), config);
    let posting = PostingUseCase::new(store.clone());
    let public_id = store.public_id(&member);

    assert!(matches!(
        moderation.ban_member(&moderator, &public_id, Some(0), None).await,
        Err(ForumError::Validation(_))
    ));

    let banned = moderation
        .ban_member(&moderator, &public_id, Some(7), Some("Spamming"))
        .await
        .unwrap();
    assert!(banned.is_banned());
    assert!(banned.banned_until.is_some());

    match posting.reply(&member, topic.id, "Hello?").await {
        Err(e @ ForumError::Banned { .. }) => assert_eq!(e.status_code(), StatusCode::FORBIDDEN),
        other => panic!("expected banned, got {other:?}"),
    }

    moderation
        .unban_member(&moderator, &public_id, None)
        .await
        .unwrap();
    posting.reply(&member, topic.id, "Back again").await.unwrap();
    assert!(matches!(
        moderation.unban_member(&moderator, &public_id, None).await,
        Err(ForumError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_permanent_ban_has_no_end() {
    let (store, config, _) = setup();
    let member = store.add_member(UserRole::Active, 90);
    let admin = store.add_member(UserRole::Admin, 365);
    let public_id = store.public_id(&member);

    let banned = ModerationUseCase::new(store.clone(), config)
        .ban_member(&admin, &public_id, None, None)
        .await
        .unwrap();
    assert!(banned.banned_until.is_none());
    assert!(store.member(&member).is_banned());
}

#[tokio::test]
async fn test_role_changes_follow_rank() {
    let (store, config, _) = setup();
    let member = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let admin = store.add_member(UserRole::Admin, 365);
    let moderation = ModerationUseCase::new(store.clone(), config);
    let member_id = store.public_id(&member);

    let promoted = moderation
        .change_role(&moderator, &member_id, UserRole::Trusted, Some("Helpful"))
        .await
        .unwrap();
    assert_eq!(promoted.role, UserRole::Trusted);

    assert!(matches!(
        moderation
            .change_role(&moderator, &member_id, UserRole::Moderator, None)
            .await,
        Err(ForumError::Outranked)
    ));
    assert!(matches!(
        moderation
            .change_role(&admin, &member_id, UserRole::Trusted, None)
            .await,
        Err(ForumError::Conflict(_))
    ));

    moderation
        .change_role(&admin, &member_id, UserRole::Moderator, None)
        .await
        .unwrap();
    let member = refreshed(&store, &member);
    assert_eq!(member.role, UserRole::Moderator);

    let admin_id = store.public_id(&admin);
    match moderation
        .change_role(&admin, &admin_id, UserRole::Member, None)
        .await
    {
        Err(e @ ForumError::SelfAction) => assert_eq!(e.status_code(), StatusCode::FORBIDDEN),
        other => panic!("expected self action, got {other:?}"),
    }
}

#[tokio::test]
async fn test_moderation_log_is_newest_first() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (topic, _) = start_topic(&store, &author, &category).await;
    let moderation = ModerationUseCase::new(store.clone(), config);

    moderation
        .switch_topic(&moderator, topic.id, TopicSwitch::Pin, None)
        .await
        .unwrap();
    moderation
        .switch_topic(&moderator, topic.id, TopicSwitch::Lock, None)
        .await
        .unwrap();
    assert!(matches!(
        moderation
            .switch_topic(&moderator, topic.id, TopicSwitch::Lock, None)
            .await,
        Err(ForumError::Conflict(_))
    ));

    let log = moderation
        .list_log(&moderator, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(log.total, 2);
    assert_eq!(log.items[0].entry.action, ModerationAction::LockTopic);
    assert_eq!(log.items[1].entry.action, ModerationAction::PinTopic);
    assert_eq!(
        log.items[0].actor.as_ref().map(|a| a.role),
        Some(UserRole::Moderator)
    );

    assert!(matches!(
        moderation.list_log(&author, PageRequest::default()).await,
        Err(ForumError::PermissionDenied(Permission::ViewModerationLog))
    ));
}

#[tokio::test]
async fn test_standing_report_counts_today() {
    let (store, _, category) = setup();
    let newcomer = store.add_member(UserRole::Newcomer, 0);
    let (topic, _) = start_topic(&store, &newcomer, &category).await;
    PostingUseCase::new(store.clone())
        .reply(&newcomer, topic.id, "Follow-up")
        .await
        .unwrap();

    let report = BrowseUseCase::new(store.clone())
        .standing(&newcomer)
        .await
        .unwrap();
    assert_eq!(report.used_today.get(LimitedAction::Topics), 1);
    assert_eq!(report.used_today.get(LimitedAction::Posts), 1);
    assert_eq!(report.remaining_today.topics, Some(1));
    assert_eq!(report.remaining_today.posts, Some(9));
    assert_eq!(report.remaining_today.votes, Some(0));
    assert!(!report.is_banned);

    let next = report.next.unwrap();
    assert_eq!(next.next_role, UserRole::Member);
    assert!(!next.eligible);
}

/// Posts by a moderator, who has no daily limits
async fn moderator_posts(
    store: &Arc<MemoryForumStore>,
    category: &Category,
    count: usize,
) -> Vec<PostId> {
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (topic, opening) = start_topic(store, &moderator, category).await;
    let posting = PostingUseCase::new(store.clone());
    let mut posts = vec![opening];
    for n in 1..count {
        let reply = posting
            .reply(&moderator, topic.id, &format!("Reply number {n}"))
            .await
            .unwrap();
        posts.push(reply.id);
    }
    posts
}

fn assert_limit_reached<T: std::fmt::Debug>(
    result: ForumResult<T>,
    action: LimitedAction,
    limit: u32,
) {
    match result {
        Err(e @ ForumError::DailyLimitReached { .. }) => {
            assert_eq!(e.status_code(), StatusCode::TOO_MANY_REQUESTS);
            assert!(matches!(
                e,
                ForumError::DailyLimitReached { action: a, limit: l } if a == action && l == limit
            ));
        }
        other => panic!("expected daily limit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_daily_limits_for_replies_votes_and_flags() {
    let (store, config, category) = setup();
    let posts = moderator_posts(&store, &category, 21).await;

    let newcomer = store.add_member(UserRole::Newcomer, 0);
    let (topic, _) = start_topic(&store, &newcomer, &category).await;
    let posting = PostingUseCase::new(store.clone());
    for n in 0..10 {
        posting
            .reply(&newcomer, topic.id, &format!("Reply number {n}"))
            .await
            .unwrap();
    }
    assert_limit_reached(
        posting.reply(&newcomer, topic.id, "One too many").await,
        LimitedAction::Posts,
        10,
    );

    let voter = store.add_member(UserRole::Member, 30);
    let voting = VoteUseCase::new(store.clone());
    for &post_id in &posts[..20] {
        voting.execute(&voter, post_id, 1).await.unwrap();
    }
    assert_limit_reached(
        voting.execute(&voter, posts[20], 1).await,
        LimitedAction::Votes,
        20,
    );
    // Withdrawing a vote is never limited
    voting.execute(&voter, posts[0], 0).await.unwrap();

    let flagger = store.add_member(UserRole::Member, 30);
    let flagging = FlagUseCase::new(store.clone(), config);
    for &post_id in &posts[..5] {
        flagging.execute(&flagger, post_id, "Spam link").await.unwrap();
    }
    assert_limit_reached(
        flagging.execute(&flagger, posts[5], "Spam link").await,
        LimitedAction::Flags,
        5,
    );
    assert!(!store.post(posts[5]).is_hidden);
}

#[tokio::test]
async fn test_store_checks_quota_with_the_insert() {
    let (store, _, category) = setup();
    let newcomer = store.add_member(UserRole::Newcomer, 0);
    start_topic(&store, &newcomer, &category).await;
    start_topic(&store, &newcomer, &category).await;

    // A request that passed its checks before the second topic landed
    let quota = daily_quota(UserRole::Newcomer, LimitedAction::Topics, Utc::now()).unwrap();
    let topic = Topic::new(category.id, newcomer.user_id, "Late arrival".to_string());
    let opening = Post::new(topic.id, newcomer.user_id, "Raced the others".to_string(), true);
    assert!(matches!(
        store.create_topic(&topic, &opening, quota).await,
        Err(ForumError::DailyLimitReached { limit: 2, .. })
    ));

    let data = store.inner.lock().unwrap();
    assert_eq!(data.topics.len(), 2);
    assert!(data.posts.iter().all(|p| p.id != opening.id));
}

#[tokio::test]
async fn test_newcomer_cannot_flag() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let newcomer = store.add_member(UserRole::Newcomer, 5);
    let (_, post_id) = start_topic(&store, &author, &category).await;

    match FlagUseCase::new(store.clone(), config)
        .execute(&newcomer, post_id, "Spam link")
        .await
    {
        Err(e @ ForumError::PermissionDenied(Permission::Flag)) => {
            assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
        }
        other => panic!("expected permission denied, got {other:?}"),
    }
    assert!(store.inner.lock().unwrap().flags.is_empty());
}

#[tokio::test]
async fn test_banned_member_cannot_vote_flag_or_start_topics() {
    let (store, config, category) = setup();
    let member = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (_, post_id) = start_topic(&store, &moderator, &category).await;
    ModerationUseCase::new(store.clone(), config.clone())
        .ban_member(&moderator, &store.public_id(&member), Some(3), Some("Spamming"))
        .await
        .unwrap();

    assert!(matches!(
        VoteUseCase::new(store.clone()).execute(&member, post_id, 1).await,
        Err(ForumError::Banned { until: Some(_) })
    ));
    assert!(matches!(
        FlagUseCase::new(store.clone(), config)
            .execute(&member, post_id, "Spam link")
            .await,
        Err(ForumError::Banned { .. })
    ));
    let topic = PostingUseCase::new(store.clone())
        .create_topic(
            &member,
            NewTopicInput {
                category_id: category.id,
                title: "Still around".to_string(),
                body: "Trying anyway".to_string(),
            },
        )
        .await;
    match topic {
        Err(e @ ForumError::Banned { .. }) => assert_eq!(e.status_code(), StatusCode::FORBIDDEN),
        other => panic!("expected banned, got {other:?}"),
    }

    assert_eq!(store.post(post_id).score, 0);
    let data = store.inner.lock().unwrap();
    assert!(data.flags.is_empty());
    assert_eq!(data.topics.len(), 1);
}

#[tokio::test]
async fn test_hidden_or_deleted_posts_cannot_be_voted_or_flagged() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let member = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (topic, hidden) = start_topic(&store, &author, &category).await;
    ModerationUseCase::new(store.clone(), config.clone())
        .hide_post(&moderator, hidden, None)
        .await
        .unwrap();
    let posting = PostingUseCase::new(store.clone());
    let deleted = posting
        .reply(&author, topic.id, "Posted by mistake")
        .await
        .unwrap()
        .id;
    posting.delete_post(&author, deleted).await.unwrap();

    let voting = VoteUseCase::new(store.clone());
    let flagging = FlagUseCase::new(store.clone(), config);
    for post_id in [hidden, deleted] {
        assert!(matches!(
            voting.execute(&member, post_id, 1).await,
            Err(ForumError::NotFound("Post"))
        ));
        assert!(matches!(
            flagging.execute(&member, post_id, "Spam link").await,
            Err(ForumError::NotFound("Post"))
        ));
    }

    let data = store.inner.lock().unwrap();
    assert!(data.votes.is_empty());
    assert!(data.flags.is_empty());
}

#[tokio::test]
async fn test_hiding_post_resolves_its_flags() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let flagger = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (_, post_id) = start_topic(&store, &author, &category).await;
    FlagUseCase::new(store.clone(), config.clone())
        .execute(&flagger, post_id, "Rude reply")
        .await
        .unwrap();

    let moderation = ModerationUseCase::new(store.clone(), config);
    moderation
        .hide_post(&moderator, post_id, Some("Rude reply"))
        .await
        .unwrap();

    {
        let data = store.inner.lock().unwrap();
        assert_eq!(data.flags[0].status, FlagStatus::Resolved);
        assert_eq!(data.flags[0].resolved_by, Some(moderator.user_id));
        assert_eq!(data.log[0].details["flagsResolved"], 1);
    }
    let queue = moderation
        .list_flags(&moderator, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(queue.total, 0);
}

#[tokio::test]
async fn test_moderation_change_without_effect_writes_no_entry() {
    let (store, config, category) = setup();
    let author = store.add_member(UserRole::Member, 30);
    let moderator = store.add_member(UserRole::Moderator, 90);
    let (_, post_id) = start_topic(&store, &author, &category).await;
    ModerationUseCase::new(store.clone(), config)
        .hide_post(&moderator, post_id, None)
        .await
        .unwrap();

    // An auto-hide racing the moderator finds the post already hidden
    let change = ModerationChange::HidePost {
        post_id,
        resolved_by: None,
    };
    let entry = ModerationEntry::new(
        None,
        ModerationAction::AutoHidePost,
        TargetKind::Post,
        post_id.into_uuid(),
        None,
        serde_json::json!({ "openFlags": 3 }),
    );
    assert!(store.apply_moderation(&change, &entry).await.unwrap().is_none());

    // A promotion step computed from a role the member no longer holds
    let change = ModerationChange::SetRole {
        user_id: author.user_id,
        from: UserRole::Newcomer,
        to: UserRole::Member,
    };
    let entry = ModerationEntry::new(
        None,
        ModerationAction::AutoPromote,
        TargetKind::Member,
        author.user_id.into_uuid(),
        None,
        serde_json::json!({}),
    );
    assert!(store.apply_moderation(&change, &entry).await.unwrap().is_none());
    assert_eq!(store.member(&author).role, UserRole::Member);

    assert_eq!(
        store.log_actions(),
        vec![(ModerationAction::HidePost, Some(moderator.user_id))]
    );
}

#[tokio::test]
async fn test_categories_need_admin() {
    let (store, _, _) = setup();
    let moderator = store.add_member(UserRole::Moderator, 90);
    let admin = store.add_member(UserRole::Admin, 365);
    let categories = CategoryUseCase::new(store.clone());

    let input = |slug: &str| CategoryInput {
        slug: slug.to_string(),
        title: "Help desk".to_string(),
        description: "Questions and answers".to_string(),
        position: 2,
        min_role: UserRole::Newcomer,
    };

    assert!(matches!(
        categories.create(&moderator, input("help")).await,
        Err(ForumError::PermissionDenied(Permission::ManageCategories))
    ));
    categories.create(&admin, input("help")).await.unwrap();
    assert!(matches!(
        categories.create(&admin, input("help")).await,
        Err(ForumError::Conflict(_))
    ));
    assert!(matches!(
        categories.create(&admin, input("Help Desk")).await,
        Err(ForumError::Validation(_))
    ));

    let listed = BrowseUseCase::new(store.clone()).categories().await.unwrap();
    assert_eq!(listed.len(), 2);
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

fn app(store: MemoryForumStore) -> axum::Router {
    let auth = AuthMiddlewareState::new(
        Arc::new(NoSessions),
        Arc::new(AuthConfig::development()),
    );
    forum_router_generic(store, auth, ForumConfig::default())
}

#[tokio::test]
async fn test_router_public_and_protected_routes() {
    let store = MemoryForumStore::default();
    store.add_category("general", UserRole::Newcomer);
    let app = app(store);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/tiers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/categories/missing/topics")
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
                .uri("/topics")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"categoryId":"00000000-0000-0000-0000-000000000000","title":"Hi there","body":"Hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
