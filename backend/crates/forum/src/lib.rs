//! Forum Backend Module
//!
//! Categories, topics and posts on top of a small rules engine:
//!
//! - [`domain::role_tier::ROLE_TIERS`] says what each role may do, how often
//!   per UTC day, and what it takes to move up
//! - votes move author reputation; reputation, post count, account age and
//!   warning history drive automatic promotion up to `trusted`
//! - moderators hide, lock, pin, warn, ban and reassign roles; every action
//!   lands in the moderation log
//!
//! Forum role and account role are the same [`auth::UserRole`].

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

pub use application::config::ForumConfig;
pub use error::{ForumError, ForumResult};
pub use infra::postgres::PgForumStore;
pub use presentation::router::forum_router;
