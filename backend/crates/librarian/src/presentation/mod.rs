//! Presentation Layer

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::LibrarianAppState;
pub use router::{librarian_router, librarian_router_generic};
