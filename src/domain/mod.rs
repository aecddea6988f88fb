//! Domain layer containing the tracker's data model and core rules.
//!
//! # Architecture
//!
//! - [`frequency`] - Frequency buckets and the counter key codec
//! - [`record`] - Storage identity shared by every persisted entity
//! - [`entities`] - Core business data structures
//! - [`payload`] - Work queue message codec
//! - [`repositories`] - Durable storage trait definitions
//! - [`consolidation_worker`] - Periodic volatile to durable flush
//!
//! # Counter Flow
//!
//! 1. [`payload::Payload`] batches are decoded and counted by the ingest service
//! 2. Counters are written to the volatile tier; significant ones are registered
//! 3. [`consolidation_worker::run_consolidation_worker`] flushes registered counters
//!    to the durable tier

pub mod consolidation_worker;
pub mod entities;
pub mod frequency;
pub mod payload;
pub mod record;
pub mod repositories;
