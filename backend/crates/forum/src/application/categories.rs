//! Category Administration

use std::sync::Arc;

use auth::UserRole;
use chrono::Utc;
use kernel::id::CategoryId;

use crate::domain::entities::{Actor, Category};
use crate::domain::repository::ForumStore;
use crate::domain::role_tier::Permission;
use crate::domain::services::require_permission;
use crate::domain::value_objects::{CategorySlug, bounded};
use crate::error::{ForumError, ForumResult};

const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 1000;

pub struct CategoryInput {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub position: i32,
    pub min_role: UserRole,
}

/// Absent fields keep their current value
#[derive(Default)]
pub struct CategoryUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub min_role: Option<UserRole>,
}

pub struct CategoryUseCase<S>
where
    S: ForumStore,
{
    store: Arc<S>,
}

impl<S> CategoryUseCase<S>
where
    S: ForumStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &Actor, input: CategoryInput) -> ForumResult<Category> {
        require_permission(actor.role, Permission::ManageCategories)?;

        let category = Category {
            id: CategoryId::new(),
            slug: CategorySlug::new(&input.slug)?.into_inner(),
            title: bounded(&input.title, "Title", 2, TITLE_MAX)?,
            description: bounded(&input.description, "Description", 0, DESCRIPTION_MAX)?,
            position: input.position,
            min_role: input.min_role,
            topic_count: 0,
            created_at: Utc::now(),
        };
        self.store.create_category(&category).await?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> ForumResult<Category> {
        require_permission(actor.role, Permission::ManageCategories)?;

        let mut category = self
            .store
            .find_category(id)
            .await?
            .ok_or(ForumError::NotFound("Category"))?;

        if let Some(slug) = update.slug {
            category.slug = CategorySlug::new(&slug)?.into_inner();
        }
        if let Some(title) = update.title {
            category.title = bounded(&title, "Title", 2, TITLE_MAX)?;
        }
        if let Some(description) = update.description {
            category.description = bounded(&description, "Description", 0, DESCRIPTION_MAX)?;
        }
        if let Some(position) = update.position {
            category.position = position;
        }
        if let Some(min_role) = update.min_role {
            category.min_role = min_role;
        }

        self.store.update_category(&category).await?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category updated");
        Ok(category)
    }
}
