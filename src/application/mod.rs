//! Application layer services implementing the tracker's business logic.
//!
//! Services coordinate the storage tiers through [`crate::infrastructure::TieredStorage`]
//! and never talk to Redis or PostgreSQL directly.
//!
//! # Available Services
//!
//! - [`services::CounterService`] - Counter updates, promotion and consolidation
//! - [`services::CounterRegistry`] - Keys awaiting consolidation
//! - [`services::RendererService`] - Product view composition
//! - [`services::BanlistService`] - Lazily backfilled moderation blocklist
//! - [`services::IngestService`] - Payload batches to counter increments

pub mod services;
