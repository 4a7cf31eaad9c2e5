//! Application Layer
//!
//! Use cases. Every mutating use case takes the [`Actor`] resolved by the
//! auth middleware and re-reads the member's standing before deciding.

pub mod browse;
pub mod categories;
pub mod config;
pub mod flagging;
pub mod moderation;
pub mod posting;
pub mod promotion;
pub mod voting;

pub use browse::{BrowseUseCase, PromotionProgress, StandingReport, TopicDetail};
pub use categories::{CategoryInput, CategoryUpdate, CategoryUseCase};
pub use config::ForumConfig;
pub use flagging::{FlagOutcome, FlagUseCase};
pub use moderation::{ModerationUseCase, TopicSwitch};
pub use posting::{NewTopicInput, PostingUseCase};
pub use promotion::PromotionUseCase;
pub use voting::VoteUseCase;

use crate::domain::entities::{Actor, MemberStanding};
use crate::domain::repository::MemberRepository;
use crate::error::{ForumError, ForumResult};

pub(crate) async fn actor_standing<S>(store: &S, actor: &Actor) -> ForumResult<MemberStanding>
where
    S: MemberRepository + Sync,
{
    store
        .find_standing(actor.user_id)
        .await?
        .ok_or(ForumError::NotFound("Member"))
}
