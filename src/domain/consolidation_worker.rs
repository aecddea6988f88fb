//! Background task flushing registered counters to the durable tier.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::application::services::CounterService;

/// Runs consolidation passes every `interval` until `shutdown` flips to
/// `true` or its sender is dropped.
///
/// A failed pass is logged and retried on the next tick; registered keys
/// survive failures. One final pass runs on shutdown.
pub async fn run_consolidation_worker(
    counters: Arc<CounterService>,
    interval: Duration,
    batch_size: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        interval_seconds = interval.as_secs(),
        batch_size, "Consolidation worker started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => consolidate_once(&counters, batch_size).await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    consolidate_once(&counters, batch_size).await;
    info!("Consolidation worker stopped");
}

async fn consolidate_once(counters: &CounterService, batch_size: usize) {
    match counters.consolidate(batch_size).await {
        Ok(report) => debug!(?report, "consolidation pass"),
        Err(e) => error!(error = %e, "consolidation pass failed"),
    }
}
