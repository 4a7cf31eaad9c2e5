//! Domain Entities

use auth::UserId;
use chrono::{DateTime, Utc};
use kernel::id::{ArticleId, ChatLogEntryId};
use serde::{Deserialize, Serialize};

/// Knowledge base article
#[derive(Debug, Clone)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    /// Markdown
    pub body: String,
    /// Lowercase, deduplicated
    pub tags: Vec<String>,
    pub is_published: bool,
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Speaker of a chat message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One earlier exchange supplied by the client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Clients may only replay user and assistant turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl From<TurnRole> for MessageRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => MessageRole::User,
            TurnRole::Assistant => MessageRole::Assistant,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatLogEntry {
    pub id: ChatLogEntryId,
    pub user_id: UserId,
    pub question: String,
    pub answer: String,
    pub source_ids: Vec<ArticleId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ChatLogView {
    pub entry: ChatLogEntry,
    pub user_name: Option<String>,
}
