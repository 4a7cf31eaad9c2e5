//! Vote Use Case

use std::sync::Arc;

use chrono::Utc;
use kernel::id::PostId;

use crate::application::actor_standing;
use crate::application::promotion::PromotionUseCase;
use crate::domain::entities::{Actor, VoteOutcome};
use crate::domain::repository::ForumStore;
use crate::domain::role_tier::{LimitedAction, Permission};
use crate::domain::services::{daily_quota, ensure_not_banned, require_permission};
use crate::domain::value_objects::VoteValue;
use crate::error::{ForumError, ForumResult};

pub struct VoteUseCase<S>
where
    S: ForumStore,
{
    store: Arc<S>,
}

impl<S> VoteUseCase<S>
where
    S: ForumStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// `1` up, `-1` down, `0` withdraws. Re-sending the current value is a
    /// no-op and does not count against the daily limit.
    pub async fn execute(&self, actor: &Actor, post_id: PostId, value: i16) -> ForumResult<VoteOutcome> {
        let value = VoteValue::new(value)?;
        let now = Utc::now();

        let standing = actor_standing(&*self.store, actor).await?;
        ensure_not_banned(&standing, now)?;
        require_permission(actor.role, Permission::Vote)?;

        let post = self
            .store
            .find_post(post_id)
            .await?
            .filter(|post| post.is_visible())
            .ok_or(ForumError::NotFound("Post"))?;
        if post.author_id == actor.user_id {
            return Err(ForumError::OwnPost("vote on"));
        }

        let previous = self.store.find_vote(post.id, actor.user_id).await?;
        if previous == value.value() {
            return Ok(VoteOutcome {
                score: post.score,
                value: previous,
                reputation_delta: 0,
            });
        }

        let quota = if value.is_none() {
            None
        } else {
            daily_quota(actor.role, LimitedAction::Votes, now)?
        };

        let outcome = self
            .store
            .apply_vote(post.id, actor.user_id, post.author_id, value.value(), quota)
            .await?;

        tracing::info!(
            post_id = %post.id,
            voter = %standing.public_id,
            value = outcome.value,
            delta = outcome.reputation_delta,
            "Vote recorded"
        );

        if outcome.reputation_delta != 0 {
            PromotionUseCase::new(self.store.clone())
                .evaluate_quietly(post.author_id)
                .await;
        }

        Ok(outcome)
    }
}
