//! CMS Backend Module
//!
//! Landing page blocks and news posts. Public routes serve published
//! content only; everything under `/admin` requires the `admin` role.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

pub use error::{CmsError, CmsResult};
pub use infra::postgres::PgCmsStore;
pub use presentation::router::cms_router;
