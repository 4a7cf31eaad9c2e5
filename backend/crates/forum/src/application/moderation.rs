//! Moderation Use Cases
//!
//! Every action checks its permission, checks rank against the member or
//! content author, then hands the store one [`ModerationChange`] to write
//! together with its audit log entry.

use std::sync::Arc;

use auth::{PublicId, UserRole};
use chrono::Utc;
use kernel::id::{FlagId, PostId, TopicId};
use kernel::page::{Page, PageRequest};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::application::config::ForumConfig;
use crate::domain::entities::{
    Actor, FlagStatus, FlagView, MemberStanding, ModerationAction, ModerationChange,
    ModerationEntry, ModerationEntryView, Post, TargetKind, Topic,
};
use crate::domain::repository::ForumStore;
use crate::domain::role_tier::Permission;
use crate::domain::services::{
    can_assign_role, can_moderate_content, outranks, require_permission,
};
use crate::domain::value_objects::{BanDays, Reason};
use crate::error::{ForumError, ForumResult};

/// Which topic switch a moderator flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSwitch {
    Lock,
    Unlock,
    Pin,
    Unpin,
}

impl TopicSwitch {
    fn permission(&self) -> Permission {
        match self {
            TopicSwitch::Lock | TopicSwitch::Unlock => Permission::LockTopic,
            TopicSwitch::Pin | TopicSwitch::Unpin => Permission::PinTopic,
        }
    }

    fn action(&self) -> ModerationAction {
        match self {
            TopicSwitch::Lock => ModerationAction::LockTopic,
            TopicSwitch::Unlock => ModerationAction::UnlockTopic,
            TopicSwitch::Pin => ModerationAction::PinTopic,
            TopicSwitch::Unpin => ModerationAction::UnpinTopic,
        }
    }

    /// New `(is_locked, is_pinned)`, or `None` when already in that state
    fn apply(&self, topic: &Topic) -> Option<(bool, bool)> {
        match self {
            TopicSwitch::Lock if !topic.is_locked => Some((true, topic.is_pinned)),
            TopicSwitch::Unlock if topic.is_locked => Some((false, topic.is_pinned)),
            TopicSwitch::Pin if !topic.is_pinned => Some((topic.is_locked, true)),
            TopicSwitch::Unpin if topic.is_pinned => Some((topic.is_locked, false)),
            _ => None,
        }
    }
}

pub struct ModerationUseCase<S>
where
    S: ForumStore,
{
    store: Arc<S>,
    config: Arc<ForumConfig>,
}

impl<S> ModerationUseCase<S>
where
    S: ForumStore,
{
    pub fn new(store: Arc<S>, config: Arc<ForumConfig>) -> Self {
        Self { store, config }
    }

    pub async fn list_flags(&self, actor: &Actor, page: PageRequest) -> ForumResult<Page<FlagView>> {
        require_permission(actor.role, Permission::ReviewFlags)?;
        let (items, total) = self.store.list_open_flags(page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn dismiss_flag(
        &self,
        actor: &Actor,
        flag_id: FlagId,
        reason: Option<&str>,
    ) -> ForumResult<()> {
        require_permission(actor.role, Permission::ReviewFlags)?;
        let reason = Reason::optional(reason)?;

        let flag = self
            .store
            .find_flag(flag_id)
            .await?
            .ok_or(ForumError::NotFound("Flag"))?;
        if flag.status != FlagStatus::Open {
            return Err(ForumError::Conflict("Flag is already closed".to_string()));
        }

        self.record(
            actor,
            ModerationChange::DismissFlag {
                flag_id: flag.id,
                resolved_by: actor.user_id,
            },
            ModerationAction::DismissFlag,
            TargetKind::Flag,
            flag.id.into_uuid(),
            reason,
            json!({ "postId": flag.post_id }),
        )
        .await?
        .ok_or_else(|| ForumError::Conflict("Flag is already closed".to_string()))?;
        Ok(())
    }

    pub async fn hide_post(
        &self,
        actor: &Actor,
        post_id: PostId,
        reason: Option<&str>,
    ) -> ForumResult<()> {
        require_permission(actor.role, Permission::HidePost)?;
        let reason = Reason::optional(reason)?;
        let post = self.moderatable_post(actor, post_id).await?;
        if post.is_hidden {
            return Err(ForumError::Conflict("Post is already hidden".to_string()));
        }

        self.record(
            actor,
            ModerationChange::HidePost {
                post_id: post.id,
                resolved_by: Some(actor.user_id),
            },
            ModerationAction::HidePost,
            TargetKind::Post,
            post.id.into_uuid(),
            reason,
            json!({ "topicId": post.topic_id }),
        )
        .await?
        .ok_or_else(|| ForumError::Conflict("Post is already hidden".to_string()))?;
        Ok(())
    }

    pub async fn restore_post(
        &self,
        actor: &Actor,
        post_id: PostId,
        reason: Option<&str>,
    ) -> ForumResult<()> {
        require_permission(actor.role, Permission::HidePost)?;
        let reason = Reason::optional(reason)?;
        let post = self.moderatable_post(actor, post_id).await?;
        if !post.is_hidden {
            return Err(ForumError::Conflict("Post is not hidden".to_string()));
        }

        self.record(
            actor,
            ModerationChange::RestorePost { post_id: post.id },
            ModerationAction::RestorePost,
            TargetKind::Post,
            post.id.into_uuid(),
            reason,
            json!({ "topicId": post.topic_id }),
        )
        .await?
        .ok_or_else(|| ForumError::Conflict("Post is not hidden".to_string()))?;
        Ok(())
    }

    pub async fn switch_topic(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        switch: TopicSwitch,
        reason: Option<&str>,
    ) -> ForumResult<Topic> {
        require_permission(actor.role, switch.permission())?;
        let reason = Reason::optional(reason)?;

        let mut topic = self
            .store
            .find_topic(topic_id)
            .await?
            .ok_or(ForumError::NotFound("Topic"))?;
        let author = self.standing_of(topic.author_id).await?;
        if !can_moderate_content(actor.role, author.role) {
            return Err(ForumError::Outranked);
        }

        let already = || ForumError::Conflict(format!("Topic is already {}", switch_state(switch)));
        let (is_locked, is_pinned) = switch.apply(&topic).ok_or_else(already)?;
        self.record(
            actor,
            ModerationChange::TopicState {
                topic_id: topic.id,
                is_locked,
                is_pinned,
            },
            switch.action(),
            TargetKind::Topic,
            topic.id.into_uuid(),
            reason,
            json!({ "title": topic.title }),
        )
        .await?
        .ok_or_else(already)?;

        topic.is_locked = is_locked;
        topic.is_pinned = is_pinned;
        Ok(topic)
    }

    pub async fn warn_member(
        &self,
        actor: &Actor,
        public_id: &PublicId,
        reason: &str,
    ) -> ForumResult<()> {
        require_permission(actor.role, Permission::WarnMember)?;
        let reason = Reason::new(reason)?;
        let member = self.outranked_member(actor, public_id).await?;

        let penalty = self.config.warning_reputation_penalty;
        self.record(
            actor,
            ModerationChange::Warn {
                user_id: member.user_id,
                penalty,
                at: Utc::now(),
            },
            ModerationAction::WarnMember,
            TargetKind::Member,
            member.user_id.into_uuid(),
            Some(reason),
            json!({
                "reputationPenalty": penalty,
                "reputationAfter": member.reputation - penalty,
            }),
        )
        .await?
        .ok_or(ForumError::NotFound("Member"))?;
        Ok(())
    }

    /// `days: None` bans until lifted
    pub async fn ban_member(
        &self,
        actor: &Actor,
        public_id: &PublicId,
        days: Option<u32>,
        reason: Option<&str>,
    ) -> ForumResult<MemberStanding> {
        require_permission(actor.role, Permission::BanMember)?;
        let reason = Reason::optional(reason)?;
        let days = days
            .map(|d| BanDays::new(d, self.config.max_ban_days))
            .transpose()?;
        let mut member = self.outranked_member(actor, public_id).await?;

        let now = Utc::now();
        let until = days.map(|d| now + d.duration());
        let ban_reason = reason.as_ref().map(|r| r.as_str().to_string());
        self.record(
            actor,
            ModerationChange::Ban {
                user_id: member.user_id,
                banned_at: now,
                until,
                reason: ban_reason.clone(),
            },
            ModerationAction::BanMember,
            TargetKind::Member,
            member.user_id.into_uuid(),
            reason,
            json!({ "days": days.map(|d| d.days()), "until": until }),
        )
        .await?
        .ok_or(ForumError::NotFound("Member"))?;

        member.banned_at = Some(now);
        member.banned_until = until;
        member.ban_reason = ban_reason;
        Ok(member)
    }

    pub async fn unban_member(
        &self,
        actor: &Actor,
        public_id: &PublicId,
        reason: Option<&str>,
    ) -> ForumResult<()> {
        require_permission(actor.role, Permission::BanMember)?;
        let reason = Reason::optional(reason)?;
        let member = self.outranked_member(actor, public_id).await?;
        if !member.is_banned() {
            return Err(ForumError::Conflict("Member is not banned".to_string()));
        }

        self.record(
            actor,
            ModerationChange::Unban {
                user_id: member.user_id,
            },
            ModerationAction::UnbanMember,
            TargetKind::Member,
            member.user_id.into_uuid(),
            reason,
            json!({ "wasBannedUntil": member.banned_until }),
        )
        .await?
        .ok_or_else(|| ForumError::Conflict("Member is not banned".to_string()))?;
        Ok(())
    }

    pub async fn change_role(
        &self,
        actor: &Actor,
        public_id: &PublicId,
        role: UserRole,
        reason: Option<&str>,
    ) -> ForumResult<MemberStanding> {
        require_permission(actor.role, Permission::AssignRoles)?;
        let reason = Reason::optional(reason)?;
        let mut member = self.member(public_id).await?;

        let is_self = member.user_id == actor.user_id;
        if is_self {
            return Err(ForumError::SelfAction);
        }
        if !can_assign_role(actor.role, is_self, member.role, role) {
            return Err(ForumError::Outranked);
        }
        if member.role == role {
            return Err(ForumError::Conflict(format!(
                "Member already has the '{role}' role"
            )));
        }

        let from = member.role;
        self.record(
            actor,
            ModerationChange::SetRole {
                user_id: member.user_id,
                from,
                to: role,
            },
            ModerationAction::ChangeRole,
            TargetKind::Member,
            member.user_id.into_uuid(),
            reason,
            json!({ "from": from.code(), "to": role.code() }),
        )
        .await?
        .ok_or_else(|| {
            ForumError::Conflict(format!("Member no longer has the '{from}' role"))
        })?;

        member.role = role;
        Ok(member)
    }

    pub async fn list_log(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> ForumResult<Page<ModerationEntryView>> {
        require_permission(actor.role, Permission::ViewModerationLog)?;
        let (items, total) = self.store.list_entries(page).await?;
        Ok(Page::new(items, total, page))
    }

    /// Write `change` with its log entry; `None` when there was nothing to do
    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        actor: &Actor,
        change: ModerationChange,
        action: ModerationAction,
        target_kind: TargetKind,
        target_id: Uuid,
        reason: Option<Reason>,
        details: Value,
    ) -> ForumResult<Option<ModerationEntry>> {
        let entry = ModerationEntry::new(
            Some(actor.user_id),
            action,
            target_kind,
            target_id,
            reason.map(|r| r.as_str().to_string()),
            details,
        );
        let written = self.store.apply_moderation(&change, &entry).await?;

        if written.is_some() {
            tracing::info!(
                actor = %actor.user_id,
                action = action.code(),
                target_kind = target_kind.code(),
                target_id = %target_id,
                "Moderation action"
            );
        }
        Ok(written)
    }

    async fn standing_of(&self, user_id: auth::UserId) -> ForumResult<MemberStanding> {
        self.store
            .find_standing(user_id)
            .await?
            .ok_or(ForumError::NotFound("Member"))
    }

    async fn member(&self, public_id: &PublicId) -> ForumResult<MemberStanding> {
        self.store
            .find_standing_by_public_id(public_id)
            .await?
            .ok_or(ForumError::NotFound("Member"))
    }

    async fn outranked_member(
        &self,
        actor: &Actor,
        public_id: &PublicId,
    ) -> ForumResult<MemberStanding> {
        let member = self.member(public_id).await?;
        if member.user_id == actor.user_id {
            return Err(ForumError::SelfAction);
        }
        if !outranks(actor.role, member.role) {
            return Err(ForumError::Outranked);
        }
        Ok(member)
    }

    async fn moderatable_post(&self, actor: &Actor, post_id: PostId) -> ForumResult<Post> {
        let post = self
            .store
            .find_post(post_id)
            .await?
            .filter(|post| !post.is_deleted)
            .ok_or(ForumError::NotFound("Post"))?;
        let author = self.standing_of(post.author_id).await?;
        if !can_moderate_content(actor.role, author.role) {
            return Err(ForumError::Outranked);
        }
        Ok(post)
    }
}

fn switch_state(switch: TopicSwitch) -> &'static str {
    match switch {
        TopicSwitch::Lock => "locked",
        TopicSwitch::Unlock => "unlocked",
        TopicSwitch::Pin => "pinned",
        TopicSwitch::Unpin => "unpinned",
    }
}
