//! Domain Entities

use auth::{PublicId, UserId, UserRole};
use chrono::{DateTime, Duration, Utc};
use kernel::id::{CategoryId, FlagId, ModerationEntryId, PostId, TopicId};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::role_tier::LimitedAction;

/// The member performing an action, as resolved by the auth middleware
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: UserId,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub position: i32,
    /// Lowest role allowed to start topics here
    pub min_role: UserRole,
    pub topic_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Topic {
    pub id: TopicId,
    pub category_id: CategoryId,
    pub author_id: UserId,
    pub title: String,
    pub is_locked: bool,
    pub is_pinned: bool,
    pub post_count: i64,
    pub last_post_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(category_id: CategoryId, author_id: UserId, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: TopicId::new(),
            category_id,
            author_id,
            title,
            is_locked: false,
            is_pinned: false,
            post_count: 1,
            last_post_at: now,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: PostId,
    pub topic_id: TopicId,
    pub author_id: UserId,
    pub body: String,
    /// The post that started its topic
    pub is_opening: bool,
    pub score: i32,
    pub is_hidden: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(topic_id: TopicId, author_id: UserId, body: String, is_opening: bool) -> Self {
        Self {
            id: PostId::new(),
            topic_id,
            author_id,
            body,
            is_opening,
            score: 0,
            is_hidden: false,
            is_deleted: false,
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    /// Visible to the public
    pub fn is_visible(&self) -> bool {
        !self.is_hidden && !self.is_deleted
    }
}

/// Author details attached to listed posts and topics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub public_id: PublicId,
    pub user_name: String,
    pub role: UserRole,
    pub reputation: i32,
}

#[derive(Debug, Clone)]
pub struct TopicSummary {
    pub topic: Topic,
    pub author: AuthorSummary,
}

#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author: AuthorSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStatus {
    Open,
    Resolved,
    Dismissed,
}

impl FlagStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            FlagStatus::Open => "open",
            FlagStatus::Resolved => "resolved",
            FlagStatus::Dismissed => "dismissed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "open" => Some(FlagStatus::Open),
            "resolved" => Some(FlagStatus::Resolved),
            "dismissed" => Some(FlagStatus::Dismissed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub id: FlagId,
    pub post_id: PostId,
    pub flagger_id: UserId,
    pub reason: String,
    pub status: FlagStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Flag {
    pub fn new(post_id: PostId, flagger_id: UserId, reason: String) -> Self {
        Self {
            id: FlagId::new(),
            post_id,
            flagger_id,
            reason,
            status: FlagStatus::Open,
            created_at: Utc::now(),
            resolved_by: None,
            resolved_at: None,
        }
    }
}

/// Flag queue row with the flagged post excerpt
#[derive(Debug, Clone)]
pub struct FlagView {
    pub flag: Flag,
    pub flagger: AuthorSummary,
    pub topic_id: TopicId,
    pub post_excerpt: String,
    pub open_flags_on_post: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    HidePost,
    RestorePost,
    LockTopic,
    UnlockTopic,
    PinTopic,
    UnpinTopic,
    WarnMember,
    BanMember,
    UnbanMember,
    ChangeRole,
    DismissFlag,
    AutoHidePost,
    AutoPromote,
}

impl ModerationAction {
    pub const ALL: [ModerationAction; 13] = [
        ModerationAction::HidePost,
        ModerationAction::RestorePost,
        ModerationAction::LockTopic,
        ModerationAction::UnlockTopic,
        ModerationAction::PinTopic,
        ModerationAction::UnpinTopic,
        ModerationAction::WarnMember,
        ModerationAction::BanMember,
        ModerationAction::UnbanMember,
        ModerationAction::ChangeRole,
        ModerationAction::DismissFlag,
        ModerationAction::AutoHidePost,
        ModerationAction::AutoPromote,
    ];

    pub const fn code(&self) -> &'static str {
        use ModerationAction::*;
        match self {
            HidePost => "hide_post",
            RestorePost => "restore_post",
            LockTopic => "lock_topic",
            UnlockTopic => "unlock_topic",
            PinTopic => "pin_topic",
            UnpinTopic => "unpin_topic",
            WarnMember => "warn_member",
            BanMember => "ban_member",
            UnbanMember => "unban_member",
            ChangeRole => "change_role",
            DismissFlag => "dismiss_flag",
            AutoHidePost => "auto_hide_post",
            AutoPromote => "auto_promote",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Post,
    Topic,
    Member,
    Flag,
}

impl TargetKind {
    pub const fn code(&self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Topic => "topic",
            TargetKind::Member => "member",
            TargetKind::Flag => "flag",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "post" => Some(TargetKind::Post),
            "topic" => Some(TargetKind::Topic),
            "member" => Some(TargetKind::Member),
            "flag" => Some(TargetKind::Flag),
            _ => None,
        }
    }
}

/// One audit trail row. `actor_id` is `None` for system actions.
#[derive(Debug, Clone)]
pub struct ModerationEntry {
    pub id: ModerationEntryId,
    pub actor_id: Option<UserId>,
    pub action: ModerationAction,
    pub target_kind: TargetKind,
    pub target_id: Uuid,
    pub reason: Option<String>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ModerationEntry {
    pub fn new(
        actor_id: Option<UserId>,
        action: ModerationAction,
        target_kind: TargetKind,
        target_id: Uuid,
        reason: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: ModerationEntryId::new(),
            actor_id,
            action,
            target_kind,
            target_id,
            reason,
            details,
            created_at: Utc::now(),
        }
    }

    /// Add a key the store only knows once the change is applied
    pub fn set_detail(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        if let Some(details) = self.details.as_object_mut() {
            details.insert(key.to_string(), value.into());
        }
    }
}

/// A moderation state change. Stores write it in the same transaction as
/// its [`ModerationEntry`], so neither exists without the other.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationChange {
    /// Hide a live post and resolve its open flags
    HidePost {
        post_id: PostId,
        resolved_by: Option<UserId>,
    },
    RestorePost {
        post_id: PostId,
    },
    TopicState {
        topic_id: TopicId,
        is_locked: bool,
        is_pinned: bool,
    },
    /// Take `penalty` reputation and stamp the warning time
    Warn {
        user_id: UserId,
        penalty: i32,
        at: DateTime<Utc>,
    },
    Ban {
        user_id: UserId,
        banned_at: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
        reason: Option<String>,
    },
    Unban {
        user_id: UserId,
    },
    /// Applies only while the member still holds `from`
    SetRole {
        user_id: UserId,
        from: UserRole,
        to: UserRole,
    },
    DismissFlag {
        flag_id: FlagId,
        resolved_by: UserId,
    },
}

#[derive(Debug, Clone)]
pub struct ModerationEntryView {
    pub entry: ModerationEntry,
    /// `None` for system actions
    pub actor: Option<AuthorSummary>,
}

/// Everything the rules engine needs to know about a member
#[derive(Debug, Clone)]
pub struct MemberStanding {
    pub user_id: UserId,
    pub public_id: PublicId,
    pub user_name: String,
    pub role: UserRole,
    pub reputation: i32,
    /// Visible, non-deleted posts authored
    pub post_count: i64,
    pub joined_at: DateTime<Utc>,
    pub last_warning_at: Option<DateTime<Utc>>,
    pub banned_at: Option<DateTime<Utc>>,
    /// `None` with `banned_at` set means until lifted
    pub banned_until: Option<DateTime<Utc>>,
    pub ban_reason: Option<String>,
}

impl MemberStanding {
    pub fn is_banned_at(&self, now: DateTime<Utc>) -> bool {
        match (self.banned_at, self.banned_until) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(_), Some(until)) => now < until,
        }
    }

    pub fn is_banned(&self) -> bool {
        self.is_banned_at(Utc::now())
    }

    pub fn account_age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.joined_at
    }

    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            public_id: self.public_id,
            user_name: self.user_name.clone(),
            role: self.role,
            reputation: self.reputation,
        }
    }
}

/// Counters since the start of the current UTC day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub topics: u32,
    pub posts: u32,
    pub votes: u32,
    pub flags: u32,
}

impl DailyActivity {
    pub fn get(&self, action: LimitedAction) -> u32 {
        match action {
            LimitedAction::Topics => self.topics,
            LimitedAction::Posts => self.posts,
            LimitedAction::Votes => self.votes,
            LimitedAction::Flags => self.flags,
        }
    }
}

/// Result of recording a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub score: i32,
    pub value: i16,
    pub reputation_delta: i32,
}
