//! Language Model Port

use crate::domain::entities::ChatMessage;
use crate::error::LibrarianResult;

/// Chat completion backend
#[trait_variant::make(LanguageModel: Send)]
pub trait LocalLanguageModel {
    /// The assistant reply to `messages`. Failures are
    /// `LibrarianError::Model`.
    async fn complete(&self, messages: &[ChatMessage]) -> LibrarianResult<String>;
}
