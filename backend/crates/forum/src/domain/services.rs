//! Domain Services
//!
//! Pure rules: no I/O, `now` is always passed in so every decision is
//! reproducible in tests.

use auth::UserRole;
use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::domain::entities::{DailyActivity, MemberStanding};
use crate::domain::role_tier::{LimitedAction, Permission, Promotion, PromotionCriteria, tier_for};
use crate::error::{ForumError, ForumResult};

/// Automatic promotion never goes past this role
pub const AUTO_PROMOTION_CEILING: UserRole = UserRole::Trusted;

/// Midnight UTC of the day `now` falls in; daily counters start here.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub fn has_permission(role: UserRole, permission: Permission) -> bool {
    tier_for(role).has(permission)
}

pub fn require_permission(role: UserRole, permission: Permission) -> ForumResult<()> {
    if has_permission(role, permission) {
        Ok(())
    } else {
        Err(ForumError::PermissionDenied(permission))
    }
}

/// A daily allowance, checked by the store in the same transaction as the
/// write it guards so parallel requests cannot overshoot it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuota {
    pub action: LimitedAction,
    pub limit: u32,
    pub since: DateTime<Utc>,
}

impl DailyQuota {
    /// Rejects once `used` has reached the limit (429)
    pub fn admit(&self, used: u32) -> ForumResult<()> {
        if used >= self.limit {
            Err(ForumError::DailyLimitReached {
                action: self.action,
                limit: self.limit,
            })
        } else {
            Ok(())
        }
    }
}

/// Today's allowance for `action`. `None` is unlimited; a `Some(0)` limit
/// means the action is unavailable at this role (403).
pub fn daily_quota(
    role: UserRole,
    action: LimitedAction,
    now: DateTime<Utc>,
) -> ForumResult<Option<DailyQuota>> {
    match tier_for(role).limits.get(action) {
        None => Ok(None),
        Some(0) => Err(ForumError::ActionUnavailable(action)),
        Some(limit) => Ok(Some(DailyQuota {
            action,
            limit,
            since: start_of_day(now),
        })),
    }
}

/// What is left today; `None` is unlimited
pub fn remaining_today(
    role: UserRole,
    action: LimitedAction,
    activity: &DailyActivity,
) -> Option<u32> {
    tier_for(role)
        .limits
        .get(action)
        .map(|limit| limit.saturating_sub(activity.get(action)))
}

pub fn ensure_not_banned(standing: &MemberStanding, now: DateTime<Utc>) -> ForumResult<()> {
    if standing.is_banned_at(now) {
        Err(ForumError::Banned {
            until: standing.banned_until,
        })
    } else {
        Ok(())
    }
}

/// Reputation change when a vote moves from `old` to `new`
pub fn reputation_delta(old: i16, new: i16) -> i32 {
    i32::from(new) - i32::from(old)
}

/// Strictly higher role
pub fn outranks(actor: UserRole, target: UserRole) -> bool {
    actor > target
}

/// Content actions: admins act on anyone, others must outrank the author.
pub fn can_moderate_content(actor: UserRole, author: UserRole) -> bool {
    actor == UserRole::Admin || outranks(actor, author)
}

/// Manual role change: the actor must sit strictly above both the
/// member's current role and the requested one, and never on themselves.
pub fn can_assign_role(
    actor: UserRole,
    is_self: bool,
    current: UserRole,
    requested: UserRole,
) -> bool {
    !is_self && outranks(actor, current) && outranks(actor, requested)
}

/// Whether a post created at `created_at` can still be edited by `role`
pub fn within_edit_window(role: UserRole, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match tier_for(role).edit_window_hours {
        None => true,
        Some(hours) => now - created_at <= Duration::hours(hours),
    }
}

pub fn meets_criteria(
    standing: &MemberStanding,
    criteria: &PromotionCriteria,
    now: DateTime<Utc>,
) -> bool {
    let warning_free = standing
        .last_warning_at
        .is_none_or(|at| now - at >= Duration::days(criteria.warning_free_days));

    standing.reputation >= criteria.min_reputation
        && standing.post_count >= criteria.min_posts
        && standing.account_age_at(now) >= Duration::days(criteria.min_account_age_days)
        && warning_free
}

/// Roles the member should be stepped through, one tier at a time, while
/// each tier's criteria hold. Empty when nothing changes.
pub fn promotion_path(standing: &MemberStanding, now: DateTime<Utc>) -> Vec<UserRole> {
    let mut path = Vec::new();
    if standing.is_banned_at(now) {
        return path;
    }

    let mut role = standing.role;
    while role < AUTO_PROMOTION_CEILING {
        let Promotion::Automatic(criteria) = tier_for(role).promotion else {
            break;
        };
        if !meets_criteria(standing, &criteria, now) {
            break;
        }
        match role.next() {
            Some(next) => {
                path.push(next);
                role = next;
            }
            None => break,
        }
    }
    path
}
