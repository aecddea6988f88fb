//! Business logic services for the application layer.

pub mod banlist_service;
pub mod counter_registry;
pub mod counter_service;
pub mod ingest_service;
pub mod renderer_service;

pub use banlist_service::{BanlistService, BanlistState};
pub use counter_registry::CounterRegistry;
pub use counter_service::{ConsolidationReport, CounterService};
pub use ingest_service::{IngestReport, IngestService};
pub use renderer_service::RendererService;
