//! Domain Layer

pub mod entities;
pub mod model;
pub mod repository;
pub mod search;
pub mod value_objects;
