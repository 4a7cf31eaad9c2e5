//! Domain Layer

pub mod entities;
pub mod repository;
pub mod slug;
pub mod value_objects;
