//! Shared Kernel
//!
//! Vocabulary every SLOBODA crate agrees on:
//! - the unified [`error::app_error::AppError`] and its HTTP classification
//! - typed UUID identifiers
//! - pagination request/response shapes
//!
//! Nothing domain-specific lives here. If a type only makes sense inside the
//! forum or the CRM, it belongs in that crate.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod page;
