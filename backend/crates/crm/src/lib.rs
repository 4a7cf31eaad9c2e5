//! CRM Backend Module
//!
//! Public registration intake and the admin pipeline that works through it:
//! status changes along a fixed state machine, notes, search and counts.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use application::config::CrmConfig;
pub use error::{CrmError, CrmResult};
pub use infra::postgres::PgCrmStore;
pub use presentation::router::{crm_router, registration_router};
