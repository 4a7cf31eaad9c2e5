//! Automatic Promotion
//!
//! Runs after a member posts or receives a vote. Each step up is its own
//! `auto_promote` log entry with no actor, written with the role change.
//! A step only applies while the member still holds the role it starts
//! from, so two evaluations racing each other promote once.

use std::sync::Arc;

use auth::{UserId, UserRole};
use chrono::Utc;
use serde_json::json;

use crate::domain::entities::{ModerationAction, ModerationChange, ModerationEntry, TargetKind};
use crate::domain::repository::ForumStore;
use crate::domain::services::promotion_path;
use crate::error::ForumResult;

pub struct PromotionUseCase<S>
where
    S: ForumStore,
{
    store: Arc<S>,
}

impl<S> PromotionUseCase<S>
where
    S: ForumStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the final role when anything changed
    pub async fn evaluate(&self, user_id: UserId) -> ForumResult<Option<UserRole>> {
        let Some(standing) = self.store.find_standing(user_id).await? else {
            return Ok(None);
        };

        let path = promotion_path(&standing, Utc::now());
        let mut from = standing.role;
        let mut reached = None;
        for &to in &path {
            let entry = ModerationEntry::new(
                None,
                ModerationAction::AutoPromote,
                TargetKind::Member,
                user_id.into_uuid(),
                None,
                json!({
                    "from": from.code(),
                    "to": to.code(),
                    "reputation": standing.reputation,
                    "postCount": standing.post_count,
                }),
            );
            let change = ModerationChange::SetRole { user_id, from, to };
            if self.store.apply_moderation(&change, &entry).await?.is_none() {
                break;
            }

            tracing::info!(
                public_id = %standing.public_id,
                from = %from,
                to = %to,
                "Member promoted automatically"
            );
            from = to;
            reached = Some(to);
        }

        Ok(reached)
    }

    /// Promotion must never fail the action that triggered it
    pub async fn evaluate_quietly(&self, user_id: UserId) {
        if let Err(e) = self.evaluate(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Promotion check failed");
        }
    }
}
