//! Landing Page Blocks

use std::collections::BTreeMap;
use std::sync::Arc;

use auth::UserId;
use chrono::Utc;

use crate::domain::entities::LandingBlock;
use crate::domain::repository::CmsStore;
use crate::domain::value_objects::BlockKey;
use crate::error::{CmsError, CmsResult};

/// Serialized content above this size is refused
const CONTENT_MAX_BYTES: usize = 64 * 1024;

pub struct LandingUseCase<S>
where
    S: CmsStore,
{
    store: Arc<S>,
}

impl<S> LandingUseCase<S>
where
    S: CmsStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Published blocks keyed by block key
    pub async fn public_blocks(&self) -> CmsResult<BTreeMap<String, serde_json::Value>> {
        let blocks = self.store.list_blocks(true).await?;
        Ok(blocks
            .into_iter()
            .map(|block| (block.key, block.content))
            .collect())
    }

    pub async fn all_blocks(&self) -> CmsResult<Vec<LandingBlock>> {
        self.store.list_blocks(false).await
    }

    pub async fn put_block(
        &self,
        editor: UserId,
        key: &str,
        content: serde_json::Value,
        is_published: bool,
    ) -> CmsResult<LandingBlock> {
        let key = BlockKey::new(key)?;
        if content.is_null() {
            return Err(CmsError::Validation("Block content is required".to_string()));
        }
        let size = serde_json::to_vec(&content)
            .map_err(|e| CmsError::Internal(e.to_string()))?
            .len();
        if size > CONTENT_MAX_BYTES {
            return Err(CmsError::Validation(format!(
                "Block content must be at most {} KiB",
                CONTENT_MAX_BYTES / 1024
            )));
        }

        let block = LandingBlock {
            key: key.into_inner(),
            content,
            is_published,
            updated_by: Some(editor),
            updated_at: Utc::now(),
        };
        self.store.upsert_block(&block).await?;

        tracing::info!(key = %block.key, published = is_published, "Landing block saved");
        Ok(block)
    }
}
