//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for the two storage tiers.
//!
//! # Modules
//!
//! - [`cache`] - Volatile tier (Redis and in-process implementations)
//! - [`persistence`] - Durable tier (PostgreSQL and in-memory implementations)
//! - [`tiered_storage`] - Composition of both tiers behind an explicit [`Tier`]

pub mod cache;
pub mod persistence;
pub mod tiered_storage;

pub use tiered_storage::{Tier, TieredStorage};
