//! Entities

pub mod auth_session;
pub mod credential;
pub mod user;
