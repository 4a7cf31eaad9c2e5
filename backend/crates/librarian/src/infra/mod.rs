//! Infrastructure Layer

pub mod http_model;
pub mod postgres;
