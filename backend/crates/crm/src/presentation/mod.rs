//! Presentation Layer

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::{CrmAppState, IntakeAppState};
pub use router::{crm_router, crm_router_generic, registration_router, registration_router_generic};
