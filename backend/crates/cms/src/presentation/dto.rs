//! API DTOs

use chrono::{DateTime, Utc};
use kernel::id::CmsPostId;
use serde::{Deserialize, Serialize};

use crate::application::{NewsInput, NewsUpdate};
use crate::domain::entities::{LandingBlock, NewsPostView, PostStatus};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingBlockRequest {
    pub content: serde_json::Value,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    pub body: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub publish: bool,
}

impl From<CreateNewsRequest> for NewsInput {
    fn from(req: CreateNewsRequest) -> Self {
        NewsInput {
            title: req.title,
            slug: req.slug,
            excerpt: req.excerpt,
            body: req.body,
            cover_url: req.cover_url,
            publish: req.publish,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub cover_url: Option<String>,
}

impl From<UpdateNewsRequest> for NewsUpdate {
    fn from(req: UpdateNewsRequest) -> Self {
        NewsUpdate {
            title: req.title,
            slug: req.slug,
            excerpt: req.excerpt,
            body: req.body,
            cover_url: req.cover_url,
        }
    }
}

/// `?status=draft|published` on the admin list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingBlockResponse {
    pub key: String,
    pub content: serde_json::Value,
    pub is_published: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<LandingBlock> for LandingBlockResponse {
    fn from(block: LandingBlock) -> Self {
        Self {
            key: block.key,
            content: block.content,
            is_published: block.is_published,
            updated_at: block.updated_at,
        }
    }
}

/// List item; no body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSummaryResponse {
    pub id: CmsPostId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub cover_url: Option<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub author_name: String,
}

impl From<NewsPostView> for NewsSummaryResponse {
    fn from(view: NewsPostView) -> Self {
        let post = view.post;
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            cover_url: post.cover_url,
            status: post.status,
            published_at: post.published_at,
            author_name: view.author_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub id: CmsPostId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Markdown
    pub body: String,
    pub cover_url: Option<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NewsPostView> for NewsResponse {
    fn from(view: NewsPostView) -> Self {
        let post = view.post;
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            body: post.body,
            cover_url: post.cover_url,
            status: post.status,
            published_at: post.published_at,
            author_name: view.author_name,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_request_defaults_to_published() {
        let req: LandingBlockRequest =
            serde_json::from_str(r#"{"content":{"headline":"Hi"}}"#).unwrap();
        assert!(req.is_published);

        let req: LandingBlockRequest =
            serde_json::from_str(r#"{"content":[],"isPublished":false}"#).unwrap();
        assert!(!req.is_published);
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateNewsRequest =
            serde_json::from_str(r#"{"title":"Spring meetup","body":"Details"}"#).unwrap();
        assert_eq!(req.slug, None);
        assert_eq!(req.excerpt, "");
        assert!(!req.publish);
    }
}
