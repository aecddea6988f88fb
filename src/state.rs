//! Service container shared by the binaries.

use std::sync::Arc;

use crate::application::services::{
    BanlistService, CounterRegistry, CounterService, IngestService, RendererService,
};
use crate::domain::entities::CounterThresholds;
use crate::infrastructure::TieredStorage;

/// The tracker's services wired onto one [`TieredStorage`].
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<TieredStorage>,
    pub counters: Arc<CounterService>,
    pub renderers: Arc<RendererService>,
    pub banlist: Arc<BanlistService>,
    pub ingest: Arc<IngestService>,
}

impl AppState {
    pub fn new(storage: Arc<TieredStorage>, thresholds: CounterThresholds) -> Self {
        let registry = Arc::new(CounterRegistry::new(storage.clone()));
        let counters = Arc::new(CounterService::new(storage.clone(), registry, thresholds));
        let renderers = Arc::new(RendererService::new(storage.clone(), counters.clone()));
        let banlist = Arc::new(BanlistService::new(storage.clone()));
        let ingest = Arc::new(IngestService::new(
            storage.clone(),
            counters.clone(),
            banlist.clone(),
        ));

        Self {
            storage,
            counters,
            renderers,
            banlist,
            ingest,
        }
    }
}
