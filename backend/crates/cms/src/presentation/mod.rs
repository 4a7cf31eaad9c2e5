//! Presentation Layer

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::CmsAppState;
pub use router::{cms_router, cms_router_generic};
