//! Librarian Chat
//!
//! A question is answered from the knowledge base: matching articles are
//! placed in the system prompt and the model is asked to stay within them.

use std::sync::Arc;

use auth::UserId;
use chrono::Utc;
use kernel::id::{ArticleId, ChatLogEntryId};
use kernel::page::{Page, PageRequest};
use platform::rate_limit::RateLimitStore;

use crate::application::config::LibrarianConfig;
use crate::domain::entities::{ChatLogEntry, ChatLogView, ChatMessage, ChatTurn, MessageRole};
use crate::domain::model::LanguageModel;
use crate::domain::repository::LibrarianStore;
use crate::domain::search::{ScoredArticle, rank, tokenize};
use crate::domain::value_objects::{question as parse_question, truncate_chars};
use crate::error::{LibrarianError, LibrarianResult};

const SYSTEM_PROMPT: &str = "You are the librarian of the SLOBODA community. \
Answer questions using the knowledge base articles below. \
If the articles do not cover the question, say that you do not know \
instead of guessing. Answer in the language the question was asked in.";

const NO_CONTEXT: &str = "No knowledge base article matched this question.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArticle {
    pub id: ArticleId,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourceArticle>,
    /// Questions left today
    pub remaining: u32,
}

/// System prompt with the context articles, the tail of the history, then
/// the question.
pub fn build_messages(
    context: &[ScoredArticle],
    history: &[ChatTurn],
    question: &str,
    config: &LibrarianConfig,
) -> Vec<ChatMessage> {
    let mut system = String::from(SYSTEM_PROMPT);
    if context.is_empty() {
        system.push_str("\n\n");
        system.push_str(NO_CONTEXT);
    }
    for scored in context {
        system.push_str("\n\n### ");
        system.push_str(&scored.article.title);
        system.push('\n');
        system.push_str(truncate_chars(&scored.article.body, config.context_chars));
    }

    let turns: Vec<&ChatTurn> = history
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .collect();
    let skip = turns.len().saturating_sub(config.history_turns);

    let mut messages = Vec::with_capacity(turns.len() - skip + 2);
    messages.push(ChatMessage::new(MessageRole::System, system));
    for turn in &turns[skip..] {
        messages.push(ChatMessage::new(
            turn.role.into(),
            truncate_chars(turn.content.trim(), config.context_chars),
        ));
    }
    messages.push(ChatMessage::new(MessageRole::User, question));
    messages
}

pub struct ChatUseCase<S, L, M>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    store: Arc<S>,
    limiter: Arc<L>,
    model: Option<Arc<M>>,
    config: Arc<LibrarianConfig>,
}

impl<S, L, M> ChatUseCase<S, L, M>
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<S>,
        limiter: Arc<L>,
        model: Option<Arc<M>>,
        config: Arc<LibrarianConfig>,
    ) -> Self {
        Self {
            store,
            limiter,
            model,
            config,
        }
    }

    /// Best matching published articles for `query`
    pub async fn search(&self, query: &str) -> LibrarianResult<Vec<ScoredArticle>> {
        let query = parse_question(query)?;
        let terms = tokenize(&query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self
            .store
            .search_candidates(&terms, self.config.candidate_limit)
            .await?;
        Ok(rank(candidates, &terms, self.config.max_context_articles))
    }

    pub async fn ask(
        &self,
        user: UserId,
        question: &str,
        history: &[ChatTurn],
    ) -> LibrarianResult<ChatAnswer> {
        let question = parse_question(question)?;
        let model = self
            .model
            .as_ref()
            .ok_or(LibrarianError::ModelUnavailable)?;

        let now_ms = Utc::now().timestamp_millis();
        let decision = self
            .limiter
            .check_and_increment(&format!("librarian:{user}"), &self.config.rate_limit())
            .await?;
        if !decision.allowed {
            return Err(LibrarianError::QuotaExceeded {
                retry_after_secs: decision.retry_after_secs(now_ms),
            });
        }

        let context = self.search(&question).await?;
        let messages = build_messages(&context, history, &question, &self.config);

        let answer = model.complete(&messages).await?.trim().to_string();
        if answer.is_empty() {
            return Err(LibrarianError::Model("Empty completion".to_string()));
        }

        let sources: Vec<SourceArticle> = context
            .into_iter()
            .map(|scored| SourceArticle {
                id: scored.article.id,
                title: scored.article.title,
            })
            .collect();

        let entry = ChatLogEntry {
            id: ChatLogEntryId::new(),
            user_id: user,
            question,
            answer,
            source_ids: sources.iter().map(|s| s.id).collect(),
            created_at: Utc::now(),
        };
        self.store.record_chat(&entry).await?;

        tracing::info!(
            user = %user,
            sources = sources.len(),
            remaining = decision.remaining,
            "Librarian question answered"
        );

        Ok(ChatAnswer {
            answer: entry.answer,
            sources,
            remaining: decision.remaining,
        })
    }

    pub async fn list_chats(&self, page: PageRequest) -> LibrarianResult<Page<ChatLogView>> {
        let (items, total) = self.store.list_chats(page).await?;
        Ok(Page::new(items, total, page))
    }
}
