//! Domain Layer
//!
//! Role tiers, entities, value objects, repository traits and the pure
//! rules that decide permissions, limits and promotion.

pub mod entities;
pub mod repository;
pub mod role_tier;
pub mod services;
pub mod value_objects;
