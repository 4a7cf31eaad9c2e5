//! Flag Use Case
//!
//! Members report posts. Reaching the configured number of open flags hides
//! the post without a moderator and resolves the flags. The hide is logged
//! only by the request that actually hid it.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::PostId;
use serde_json::json;

use crate::application::actor_standing;
use crate::application::config::ForumConfig;
use crate::domain::entities::{
    Actor, Flag, ModerationAction, ModerationChange, ModerationEntry, TargetKind,
};
use crate::domain::repository::ForumStore;
use crate::domain::role_tier::{LimitedAction, Permission};
use crate::domain::services::{daily_quota, ensure_not_banned, require_permission};
use crate::domain::value_objects::Reason;
use crate::error::{ForumError, ForumResult};

#[derive(Debug, Clone)]
pub struct FlagOutcome {
    pub flag: Flag,
    pub open_flags: i64,
    pub auto_hidden: bool,
}

pub struct FlagUseCase<S>
where
    S: ForumStore,
{
    store: Arc<S>,
    config: Arc<ForumConfig>,
}

impl<S> FlagUseCase<S>
where
    S: ForumStore,
{
    pub fn new(store: Arc<S>, config: Arc<ForumConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, actor: &Actor, post_id: PostId, reason: &str) -> ForumResult<FlagOutcome> {
        let reason = Reason::new(reason)?;
        let now = Utc::now();

        let standing = actor_standing(&*self.store, actor).await?;
        ensure_not_banned(&standing, now)?;
        require_permission(actor.role, Permission::Flag)?;

        let post = self
            .store
            .find_post(post_id)
            .await?
            .filter(|post| post.is_visible())
            .ok_or(ForumError::NotFound("Post"))?;
        if post.author_id == actor.user_id {
            return Err(ForumError::OwnPost("flag"));
        }
        if self.store.has_open_flag(post.id, actor.user_id).await? {
            return Err(ForumError::Conflict(
                "You have already flagged this post".to_string(),
            ));
        }

        let quota = daily_quota(actor.role, LimitedAction::Flags, now)?;
        let flag = Flag::new(post.id, actor.user_id, reason.as_str().to_string());
        let open_flags = self.store.create_flag(&flag, quota).await?;

        tracing::info!(
            flag_id = %flag.id,
            post_id = %post.id,
            flagger = %standing.public_id,
            open_flags,
            "Post flagged"
        );

        let mut auto_hidden = false;
        if open_flags >= self.config.auto_hide_flag_threshold {
            let change = ModerationChange::HidePost {
                post_id: post.id,
                resolved_by: None,
            };
            let entry = ModerationEntry::new(
                None,
                ModerationAction::AutoHidePost,
                TargetKind::Post,
                post.id.into_uuid(),
                None,
                json!({ "topicId": post.topic_id, "openFlags": open_flags }),
            );
            auto_hidden = self.store.apply_moderation(&change, &entry).await?.is_some();
        }
        if auto_hidden {
            tracing::warn!(
                post_id = %post.id,
                open_flags,
                "Post hidden automatically after flags"
            );
        }

        Ok(FlagOutcome {
            flag,
            open_flags,
            auto_hidden,
        })
    }
}
