//! Read-side Use Cases
//!
//! Public listings plus the caller's own standing report.

use std::sync::Arc;

use auth::{PublicId, UserRole};
use chrono::Utc;
use kernel::id::TopicId;
use kernel::page::{Page, PageRequest};

use crate::application::actor_standing;
use crate::domain::entities::{
    Actor, Category, DailyActivity, MemberStanding, PostView, Topic, TopicSummary,
};
use crate::domain::repository::ForumStore;
use crate::domain::role_tier::{DailyLimits, LimitedAction, Promotion, RoleTier, tier_for};
use crate::domain::services::{meets_criteria, remaining_today, start_of_day};
use crate::error::{ForumError, ForumResult};

pub struct TopicDetail {
    pub topic: Topic,
    pub category: Category,
    pub posts: Page<PostView>,
}

/// How far the member is from the next role
#[derive(Debug, Clone)]
pub struct PromotionProgress {
    pub next_role: UserRole,
    pub promotion: Promotion,
    /// Criteria met right now; always false for manual promotion
    pub eligible: bool,
}

pub struct StandingReport {
    pub standing: MemberStanding,
    pub tier: &'static RoleTier,
    pub used_today: DailyActivity,
    pub remaining_today: DailyLimits,
    pub is_banned: bool,
    pub next: Option<PromotionProgress>,
}

pub struct BrowseUseCase<S>
where
    S: ForumStore,
{
    store: Arc<S>,
}

impl<S> BrowseUseCase<S>
where
    S: ForumStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn categories(&self) -> ForumResult<Vec<Category>> {
        self.store.list_categories().await
    }

    pub async fn topics(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> ForumResult<(Category, Page<TopicSummary>)> {
        let category = self
            .store
            .find_category_by_slug(slug)
            .await?
            .ok_or(ForumError::NotFound("Category"))?;
        let (items, total) = self.store.list_topics(category.id, page).await?;
        Ok((category, Page::new(items, total, page)))
    }

    pub async fn topic(&self, id: TopicId, page: PageRequest) -> ForumResult<TopicDetail> {
        let topic = self
            .store
            .find_topic(id)
            .await?
            .ok_or(ForumError::NotFound("Topic"))?;
        let category = self
            .store
            .find_category(topic.category_id)
            .await?
            .ok_or(ForumError::NotFound("Category"))?;
        let (items, total) = self.store.list_posts(topic.id, page).await?;

        Ok(TopicDetail {
            topic,
            category,
            posts: Page::new(items, total, page),
        })
    }

    pub async fn member(&self, public_id: &PublicId) -> ForumResult<MemberStanding> {
        self.store
            .find_standing_by_public_id(public_id)
            .await?
            .ok_or(ForumError::NotFound("Member"))
    }

    pub async fn standing(&self, actor: &Actor) -> ForumResult<StandingReport> {
        let now = Utc::now();
        let standing = actor_standing(&*self.store, actor).await?;
        let used_today = self
            .store
            .daily_activity(actor.user_id, start_of_day(now))
            .await?;

        let tier = tier_for(standing.role);
        let remaining = |action| remaining_today(standing.role, action, &used_today);
        let remaining_today = DailyLimits {
            topics: remaining(LimitedAction::Topics),
            posts: remaining(LimitedAction::Posts),
            votes: remaining(LimitedAction::Votes),
            flags: remaining(LimitedAction::Flags),
        };

        let next = standing.role.next().and_then(|next_role| match tier.promotion {
            Promotion::Automatic(criteria) => Some(PromotionProgress {
                next_role,
                promotion: tier.promotion,
                eligible: !standing.is_banned_at(now)
                    && meets_criteria(&standing, &criteria, now),
            }),
            Promotion::Manual => Some(PromotionProgress {
                next_role,
                promotion: tier.promotion,
                eligible: false,
            }),
            Promotion::None => None,
        });

        Ok(StandingReport {
            is_banned: standing.is_banned_at(now),
            standing,
            tier,
            used_today,
            remaining_today,
            next,
        })
    }
}
