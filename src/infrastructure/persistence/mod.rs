//! Durable storage tier implementations.
//!
//! # Repositories
//!
//! - [`PgRecordRepository`] - PostgreSQL `records` table accessed through SQLx
//! - [`MemoryRecordRepository`] - In-memory stand-in with the same semantics

pub mod memory_record_repository;
pub mod pg_record_repository;

pub use memory_record_repository::MemoryRecordRepository;
pub use pg_record_repository::PgRecordRepository;
