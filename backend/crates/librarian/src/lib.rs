//! Librarian Backend Module
//!
//! Knowledge base articles, keyword search over them, and a chat that
//! answers questions from the best matching articles through a language
//! model.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use application::LibrarianConfig;
pub use error::{LibrarianError, LibrarianResult};
pub use infra::http_model::{HttpLanguageModel, LlmSettings};
pub use infra::postgres::PgLibrarianStore;
pub use presentation::router::librarian_router;
