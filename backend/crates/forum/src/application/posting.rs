//! Posting Use Cases
//!
//! Topics, replies, edits, own deletes and closing one's own topic.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{CategoryId, PostId, TopicId};

use crate::application::actor_standing;
use crate::application::promotion::PromotionUseCase;
use crate::domain::entities::{Actor, Post, Topic};
use crate::domain::repository::ForumStore;
use crate::domain::role_tier::{LimitedAction, Permission};
use crate::domain::services::{
    daily_quota, ensure_not_banned, has_permission, require_permission, within_edit_window,
};
use crate::domain::value_objects::{PostBody, TopicTitle};
use crate::error::{ForumError, ForumResult};

pub struct NewTopicInput {
    pub category_id: CategoryId,
    pub title: String,
    pub body: String,
}

pub struct PostingUseCase<S>
where
    S: ForumStore,
{
    store: Arc<S>,
}

impl<S> PostingUseCase<S>
where
    S: ForumStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_topic(&self, actor: &Actor, input: NewTopicInput) -> ForumResult<Topic> {
        let now = Utc::now();
        let standing = actor_standing(&*self.store, actor).await?;
        ensure_not_banned(&standing, now)?;
        require_permission(actor.role, Permission::CreateTopic)?;

        let category = self
            .store
            .find_category(input.category_id)
            .await?
            .ok_or(ForumError::NotFound("Category"))?;
        if actor.role < category.min_role {
            return Err(ForumError::PermissionDenied(Permission::CreateTopic));
        }

        let quota = daily_quota(actor.role, LimitedAction::Topics, now)?;

        let title = TopicTitle::new(&input.title)?;
        let body = PostBody::new(&input.body)?;

        let topic = Topic::new(category.id, actor.user_id, title.into_inner());
        let opening = Post::new(topic.id, actor.user_id, body.into_inner(), true);
        self.store.create_topic(&topic, &opening, quota).await?;

        tracing::info!(
            topic_id = %topic.id,
            category = %category.slug,
            author = %standing.public_id,
            "Topic created"
        );

        PromotionUseCase::new(self.store.clone())
            .evaluate_quietly(actor.user_id)
            .await;

        Ok(topic)
    }

    pub async fn reply(&self, actor: &Actor, topic_id: TopicId, body: &str) -> ForumResult<Post> {
        let now = Utc::now();
        let standing = actor_standing(&*self.store, actor).await?;
        ensure_not_banned(&standing, now)?;
        require_permission(actor.role, Permission::Reply)?;

        let topic = self
            .store
            .find_topic(topic_id)
            .await?
            .ok_or(ForumError::NotFound("Topic"))?;
        if topic.is_locked && !has_permission(actor.role, Permission::LockTopic) {
            return Err(ForumError::TopicLocked);
        }

        let quota = daily_quota(actor.role, LimitedAction::Posts, now)?;

        let body = PostBody::new(body)?;
        let post = Post::new(topic.id, actor.user_id, body.into_inner(), false);
        self.store.create_post(&post, quota).await?;

        tracing::info!(
            post_id = %post.id,
            topic_id = %topic.id,
            author = %standing.public_id,
            "Reply posted"
        );

        PromotionUseCase::new(self.store.clone())
            .evaluate_quietly(actor.user_id)
            .await;

        Ok(post)
    }

    pub async fn edit_post(&self, actor: &Actor, post_id: PostId, body: &str) -> ForumResult<Post> {
        require_permission(actor.role, Permission::EditOwn)?;

        let mut post = self.find_live_post(post_id).await?;
        if post.author_id != actor.user_id {
            return Err(ForumError::NotAuthor);
        }
        if post.is_hidden {
            return Err(ForumError::Conflict(
                "Post is hidden by a moderator".to_string(),
            ));
        }

        let now = Utc::now();
        if !within_edit_window(actor.role, post.created_at, now) {
            return Err(ForumError::EditWindowClosed);
        }

        let body = PostBody::new(body)?;
        self.store
            .update_post_body(post.id, body.as_str(), now)
            .await?;

        tracing::info!(post_id = %post.id, "Post edited");

        post.body = body.into_inner();
        post.edited_at = Some(now);
        Ok(post)
    }

    pub async fn delete_post(&self, actor: &Actor, post_id: PostId) -> ForumResult<()> {
        require_permission(actor.role, Permission::DeleteOwn)?;

        let post = self.find_live_post(post_id).await?;
        if post.author_id != actor.user_id {
            return Err(ForumError::NotAuthor);
        }

        self.store.soft_delete_post(post.id).await?;

        tracing::info!(post_id = %post.id, topic_id = %post.topic_id, "Post deleted by author");
        Ok(())
    }

    pub async fn close_topic(&self, actor: &Actor, topic_id: TopicId) -> ForumResult<Topic> {
        require_permission(actor.role, Permission::CloseOwnTopic)?;

        let mut topic = self
            .store
            .find_topic(topic_id)
            .await?
            .ok_or(ForumError::NotFound("Topic"))?;
        if topic.author_id != actor.user_id {
            return Err(ForumError::NotAuthor);
        }
        if topic.is_locked {
            return Err(ForumError::Conflict("Topic is already closed".to_string()));
        }

        self.store
            .set_topic_state(topic.id, true, topic.is_pinned)
            .await?;
        topic.is_locked = true;

        tracing::info!(topic_id = %topic.id, "Topic closed by author");
        Ok(topic)
    }

    async fn find_live_post(&self, post_id: PostId) -> ForumResult<Post> {
        self.store
            .find_post(post_id)
            .await?
            .filter(|post| !post.is_deleted)
            .ok_or(ForumError::NotFound("Post"))
    }
}
