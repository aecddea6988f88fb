//! Repository trait definitions for the domain layer.
//!
//! The durable tier is abstracted behind [`RecordRepository`]; the volatile
//! tier behind [`crate::infrastructure::cache::CacheService`]. Both are
//! composed by [`crate::infrastructure::TieredStorage`].
//!
//! # Testing
//!
//! Mock implementations are auto-generated via `mockall` for unit tests.
//! Integration tests in `tests/` use the in-memory implementations.

pub mod record_repository;

pub use record_repository::{RecordRepository, RecordRow};

#[cfg(test)]
pub use record_repository::MockRecordRepository;
