//! Role Tiers
//!
//! The static rules table behind the forum: what each role may do, how much
//! of it per UTC day, how long posts stay editable and what it takes to move
//! up. Permissions are cumulative, so a tier only lists what it adds.

use auth::UserRole;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    CreateTopic,
    Reply,
    EditOwn,
    Vote,
    Flag,
    DeleteOwn,
    CloseOwnTopic,
    HidePost,
    LockTopic,
    PinTopic,
    WarnMember,
    BanMember,
    ViewModerationLog,
    ReviewFlags,
    AssignRoles,
    ManageCategories,
}

impl Permission {
    pub const fn code(&self) -> &'static str {
        use Permission::*;
        match self {
            Read => "read",
            CreateTopic => "create_topic",
            Reply => "reply",
            EditOwn => "edit_own",
            Vote => "vote",
            Flag => "flag",
            DeleteOwn => "delete_own",
            CloseOwnTopic => "close_own_topic",
            HidePost => "hide_post",
            LockTopic => "lock_topic",
            PinTopic => "pin_topic",
            WarnMember => "warn_member",
            BanMember => "ban_member",
            ViewModerationLog => "view_moderation_log",
            ReviewFlags => "review_flags",
            AssignRoles => "assign_roles",
            ManageCategories => "manage_categories",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Actions counted against a daily limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitedAction {
    Topics,
    Posts,
    Votes,
    Flags,
}

impl LimitedAction {
    pub const fn code(&self) -> &'static str {
        match self {
            LimitedAction::Topics => "topics",
            LimitedAction::Posts => "posts",
            LimitedAction::Votes => "votes",
            LimitedAction::Flags => "flags",
        }
    }
}

impl fmt::Display for LimitedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-day allowance; `None` is unlimited, `Some(0)` is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLimits {
    pub topics: Option<u32>,
    pub posts: Option<u32>,
    pub votes: Option<u32>,
    pub flags: Option<u32>,
}

impl DailyLimits {
    pub const UNLIMITED: DailyLimits = DailyLimits {
        topics: None,
        posts: None,
        votes: None,
        flags: None,
    };

    const fn capped(topics: u32, posts: u32, votes: u32, flags: u32) -> Self {
        Self {
            topics: Some(topics),
            posts: Some(posts),
            votes: Some(votes),
            flags: Some(flags),
        }
    }

    pub const fn get(&self, action: LimitedAction) -> Option<u32> {
        match action {
            LimitedAction::Topics => self.topics,
            LimitedAction::Posts => self.posts,
            LimitedAction::Votes => self.votes,
            LimitedAction::Flags => self.flags,
        }
    }
}

/// Thresholds for automatic promotion to the next role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionCriteria {
    pub min_reputation: i32,
    pub min_posts: i64,
    pub min_account_age_days: i64,
    /// No moderator warning within this many days
    pub warning_free_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Promotion {
    Automatic(PromotionCriteria),
    Manual,
    /// Top of the ladder
    None,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTier {
    pub role: UserRole,
    /// Permissions this tier adds on top of the tiers below
    pub grants: &'static [Permission],
    pub limits: DailyLimits,
    /// `None` means posts stay editable forever
    pub edit_window_hours: Option<i64>,
    pub promotion: Promotion,
}

impl RoleTier {
    pub fn title(&self) -> &'static str {
        self.role.title()
    }

    /// Every permission held at this tier, lower tiers included
    pub fn permissions(&self) -> Vec<Permission> {
        ROLE_TIERS
            .iter()
            .filter(|tier| tier.role <= self.role)
            .flat_map(|tier| tier.grants.iter().copied())
            .collect()
    }

    pub fn has(&self, permission: Permission) -> bool {
        ROLE_TIERS
            .iter()
            .filter(|tier| tier.role <= self.role)
            .any(|tier| tier.grants.contains(&permission))
    }
}

pub static ROLE_TIERS: [RoleTier; 6] = [
    RoleTier {
        role: UserRole::Newcomer,
        grants: &[
            Permission::Read,
            Permission::CreateTopic,
            Permission::Reply,
            Permission::EditOwn,
        ],
        limits: DailyLimits::capped(2, 10, 0, 0),
        edit_window_hours: Some(24),
        promotion: Promotion::Automatic(PromotionCriteria {
            min_reputation: 5,
            min_posts: 3,
            min_account_age_days: 1,
            warning_free_days: 7,
        }),
    },
    RoleTier {
        role: UserRole::Member,
        grants: &[Permission::Vote, Permission::Flag, Permission::DeleteOwn],
        limits: DailyLimits::capped(5, 40, 20, 5),
        edit_window_hours: Some(24),
        promotion: Promotion::Automatic(PromotionCriteria {
            min_reputation: 50,
            min_posts: 25,
            min_account_age_days: 14,
            warning_free_days: 30,
        }),
    },
    RoleTier {
        role: UserRole::Active,
        grants: &[Permission::CloseOwnTopic],
        limits: DailyLimits::capped(10, 100, 50, 10),
        edit_window_hours: Some(72),
        promotion: Promotion::Automatic(PromotionCriteria {
            min_reputation: 200,
            min_posts: 100,
            min_account_age_days: 60,
            warning_free_days: 90,
        }),
    },
    RoleTier {
        role: UserRole::Trusted,
        grants: &[],
        limits: DailyLimits::capped(25, 300, 100, 25),
        edit_window_hours: None,
        promotion: Promotion::Manual,
    },
    RoleTier {
        role: UserRole::Moderator,
        grants: &[
            Permission::HidePost,
            Permission::LockTopic,
            Permission::PinTopic,
            Permission::WarnMember,
            Permission::BanMember,
            Permission::ViewModerationLog,
            Permission::ReviewFlags,
            Permission::AssignRoles,
        ],
        limits: DailyLimits::UNLIMITED,
        edit_window_hours: None,
        promotion: Promotion::Manual,
    },
    RoleTier {
        role: UserRole::Admin,
        grants: &[Permission::ManageCategories],
        limits: DailyLimits::UNLIMITED,
        edit_window_hours: None,
        promotion: Promotion::None,
    },
];

/// The tier row for a role
pub fn tier_for(role: UserRole) -> &'static RoleTier {
    // Rows are ordered by role id
    &ROLE_TIERS[role.id() as usize]
}
