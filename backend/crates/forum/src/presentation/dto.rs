//! API DTOs

use auth::UserRole;
use chrono::{DateTime, Utc};
use kernel::id::{CategoryId, FlagId, ModerationEntryId, PostId, TopicId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{PromotionProgress, StandingReport};
use crate::domain::entities::{
    AuthorSummary, Category, FlagView, MemberStanding, ModerationAction, ModerationEntryView,
    Post, PostView, TargetKind, Topic, TopicSummary,
};
use crate::domain::role_tier::{DailyLimits, Permission, Promotion, RoleTier};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    pub category_id: Uuid,
    pub title: String,
    pub body: String,
}

/// Reply or edit
#[derive(Debug, Clone, Deserialize)]
pub struct PostBodyRequest {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    pub value: i16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagRequest {
    pub reason: String,
}

/// Optional body of most moderation actions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarnRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BanRequest {
    /// Absent bans until lifted
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub min_role: UserRole,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdateRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub min_role: Option<UserRole>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierResponse {
    pub role: UserRole,
    pub title: &'static str,
    pub permissions: Vec<Permission>,
    pub limits: DailyLimits,
    pub edit_window_hours: Option<i64>,
    pub promotion: Promotion,
}

impl From<&RoleTier> for TierResponse {
    fn from(tier: &RoleTier) -> Self {
        Self {
            role: tier.role,
            title: tier.title(),
            permissions: tier.permissions(),
            limits: tier.limits,
            edit_window_hours: tier.edit_window_hours,
            promotion: tier.promotion,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub public_id: String,
    pub user_name: String,
    pub role: UserRole,
    pub role_title: &'static str,
    pub reputation: i32,
}

impl From<AuthorSummary> for AuthorResponse {
    fn from(author: AuthorSummary) -> Self {
        Self {
            public_id: author.public_id.to_string(),
            user_name: author.user_name,
            role: author.role,
            role_title: author.role.title(),
            reputation: author.reputation,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub position: i32,
    pub min_role: UserRole,
    pub topic_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            slug: category.slug,
            title: category.title,
            description: category.description,
            position: category.position,
            min_role: category.min_role,
            topic_count: category.topic_count,
            created_at: category.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicResponse {
    pub id: TopicId,
    pub category_id: CategoryId,
    pub title: String,
    pub is_locked: bool,
    pub is_pinned: bool,
    pub post_count: i64,
    pub last_post_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
}

impl From<Topic> for TopicResponse {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id,
            category_id: topic.category_id,
            title: topic.title,
            is_locked: topic.is_locked,
            is_pinned: topic.is_pinned,
            post_count: topic.post_count,
            last_post_at: topic.last_post_at,
            created_at: topic.created_at,
            author: None,
        }
    }
}

impl From<TopicSummary> for TopicResponse {
    fn from(summary: TopicSummary) -> Self {
        Self {
            author: Some(summary.author.into()),
            ..summary.topic.into()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: PostId,
    pub topic_id: TopicId,
    pub body: String,
    pub is_opening: bool,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            topic_id: post.topic_id,
            body: post.body,
            is_opening: post.is_opening,
            score: post.score,
            created_at: post.created_at,
            edited_at: post.edited_at,
            author: None,
        }
    }
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        Self {
            author: Some(view.author.into()),
            ..view.post.into()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicListResponse {
    pub category: CategoryResponse,
    pub topics: kernel::page::Page<TopicResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicDetailResponse {
    pub topic: TopicResponse,
    pub category: CategoryResponse,
    pub posts: kernel::page::Page<PostResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub public_id: String,
    pub user_name: String,
    pub role: UserRole,
    pub role_title: &'static str,
    pub reputation: i32,
    pub post_count: i64,
    pub joined_at: DateTime<Utc>,
    pub is_banned: bool,
    pub banned_until: Option<DateTime<Utc>>,
}

impl From<&MemberStanding> for MemberResponse {
    fn from(member: &MemberStanding) -> Self {
        let is_banned = member.is_banned();
        Self {
            public_id: member.public_id.to_string(),
            user_name: member.user_name.clone(),
            role: member.role,
            role_title: member.role.title(),
            reputation: member.reputation,
            post_count: member.post_count,
            joined_at: member.joined_at,
            is_banned,
            banned_until: if is_banned { member.banned_until } else { None },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRoleResponse {
    pub role: UserRole,
    pub role_title: &'static str,
    pub promotion: Promotion,
    pub eligible: bool,
}

impl From<PromotionProgress> for NextRoleResponse {
    fn from(progress: PromotionProgress) -> Self {
        Self {
            role: progress.next_role,
            role_title: progress.next_role.title(),
            promotion: progress.promotion,
            eligible: progress.eligible,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingResponse {
    pub member: MemberResponse,
    pub permissions: Vec<Permission>,
    pub limits: DailyLimits,
    pub used_today: crate::domain::entities::DailyActivity,
    pub remaining_today: DailyLimits,
    pub edit_window_hours: Option<i64>,
    pub last_warning_at: Option<DateTime<Utc>>,
    pub next: Option<NextRoleResponse>,
}

impl From<StandingReport> for StandingResponse {
    fn from(report: StandingReport) -> Self {
        Self {
            member: MemberResponse::from(&report.standing),
            permissions: report.tier.permissions(),
            limits: report.tier.limits,
            used_today: report.used_today,
            remaining_today: report.remaining_today,
            edit_window_hours: report.tier.edit_window_hours,
            last_warning_at: report.standing.last_warning_at,
            next: report.next.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteResponse {
    pub score: i32,
    pub value: i16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagResponse {
    pub flag_id: FlagId,
    pub open_flags: i64,
    pub auto_hidden: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagQueueItem {
    pub id: FlagId,
    pub post_id: PostId,
    pub topic_id: TopicId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub flagger: AuthorResponse,
    pub post_excerpt: String,
    pub open_flags_on_post: i64,
}

impl From<FlagView> for FlagQueueItem {
    fn from(view: FlagView) -> Self {
        Self {
            id: view.flag.id,
            post_id: view.flag.post_id,
            topic_id: view.topic_id,
            reason: view.flag.reason,
            created_at: view.flag.created_at,
            flagger: view.flagger.into(),
            post_excerpt: view.post_excerpt,
            open_flags_on_post: view.open_flags_on_post,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationEntryResponse {
    pub id: ModerationEntryId,
    /// `None` for system actions
    pub actor: Option<AuthorResponse>,
    pub action: ModerationAction,
    pub target_kind: TargetKind,
    pub target_id: Uuid,
    pub reason: Option<String>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<ModerationEntryView> for ModerationEntryResponse {
    fn from(view: ModerationEntryView) -> Self {
        Self {
            id: view.entry.id,
            actor: view.actor.map(Into::into),
            action: view.entry.action,
            target_kind: view.entry.target_kind,
            target_id: view.entry.target_id,
            reason: view.entry.reason,
            details: view.entry.details,
            created_at: view.entry.created_at,
        }
    }
}
