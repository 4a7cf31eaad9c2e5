//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no SLOBODA vocabulary in them:
//! - Cryptographic helpers (SHA-256, HMAC-signed tokens)
//! - Password hashing (Argon2id)
//! - Cookie building/parsing
//! - Client identification (IP, User-Agent fingerprint)
//! - Fixed-window rate limiting backed by Postgres

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
