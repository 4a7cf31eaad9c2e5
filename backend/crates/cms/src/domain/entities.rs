//! Domain Entities

use auth::UserId;
use chrono::{DateTime, Utc};
use kernel::id::CmsPostId;
use serde::Serialize;

/// A keyed piece of landing page content. The frontend owns the JSON shape.
#[derive(Debug, Clone)]
pub struct LandingBlock {
    pub key: String,
    pub content: serde_json::Value,
    pub is_published: bool,
    pub updated_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsPost {
    pub id: CmsPostId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub cover_url: Option<String>,
    pub status: PostStatus,
    /// First publication; kept when a post is unpublished
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewsPost {
    pub fn is_public(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// A post with its author's display name
#[derive(Debug, Clone)]
pub struct NewsPostView {
    pub post: NewsPost,
    pub author_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        for status in [PostStatus::Draft, PostStatus::Published] {
            assert_eq!(PostStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(PostStatus::from_code("archived"), None);
    }
}
