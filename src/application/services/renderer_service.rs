//! Product view composition.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::domain::entities::{CounterKind, ProductRenderer};
use crate::domain::frequency::Frequency;
use crate::error::AppError;
use crate::infrastructure::{Tier, TieredStorage};

use super::counter_service::CounterService;

/// Service building point-in-time product views.
///
/// A renderer for a frequency that has no stored record yet is composed from
/// a sibling-frequency renderer of the same product and date.
pub struct RendererService {
    storage: Arc<TieredStorage>,
    counters: Arc<CounterService>,
}

impl RendererService {
    pub fn new(storage: Arc<TieredStorage>, counters: Arc<CounterService>) -> Self {
        Self { storage, counters }
    }

    /// Loads the stored renderer for a product bucket.
    pub async fn get(
        &self,
        product_key: &str,
        frequency: Frequency,
        date: NaiveDate,
    ) -> Result<Option<ProductRenderer>, AppError> {
        let key = ProductRenderer::key_for(product_key, frequency, date)?;
        Ok(self.storage.get::<ProductRenderer>(&key, Tier::Both).await?)
    }

    /// Builds a renderer for `frequency` from the first existing sibling.
    ///
    /// Siblings are searched in the fixed order daily, monthly, weekly,
    /// skipping the requested frequency. The new renderer carries every
    /// attribute of the sibling except its bucket fields and count, and the
    /// caller's `count`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(renderer))` if a sibling exists (the renderer is not saved)
    /// - `Ok(None)` if no sibling exists yet; this is not an error
    pub async fn build(
        &self,
        product_key: &str,
        frequency: Frequency,
        date: NaiveDate,
        count: u64,
    ) -> Result<Option<ProductRenderer>, AppError> {
        for sibling in frequency.siblings() {
            if let Some(source) = self.get(product_key, sibling, date).await? {
                debug!(product = product_key, %frequency, %sibling, "renderer composed from sibling");
                let renderer = ProductRenderer::with_attributes(
                    product_key,
                    frequency,
                    date,
                    count,
                    source.clone_properties(),
                )?;
                return Ok(Some(renderer));
            }
        }

        debug!(product = product_key, %frequency, "no sibling renderer yet");
        Ok(None)
    }

    /// Refreshes the view of a product bucket with its current count.
    ///
    /// Updates the stored renderer if one exists, otherwise composes one from
    /// a sibling. Saves and returns the result; `Ok(None)` when there is
    /// nothing to compose from.
    pub async fn render(
        &self,
        product_key: &str,
        frequency: Frequency,
        date: NaiveDate,
    ) -> Result<Option<ProductRenderer>, AppError> {
        let count = self
            .counters
            .get(CounterKind::Product, product_key, frequency, date)
            .await?
            .map(|c| c.count)
            .unwrap_or(0);

        let renderer = match self.get(product_key, frequency, date).await? {
            Some(mut existing) => {
                existing.count = count;
                Some(existing)
            }
            None => self.build(product_key, frequency, date, count).await?,
        };

        if let Some(renderer) = &renderer {
            self.save(std::slice::from_ref(renderer)).await?;
        }
        Ok(renderer)
    }

    /// Stores renderers on both tiers.
    pub async fn save(&self, renderers: &[ProductRenderer]) -> Result<(), AppError> {
        let failed = self.storage.put(renderers, Tier::Both).await?;
        if let Some(key) = failed.first() {
            return Err(crate::error::StorageError::DurableWrite(key.cache_key()).into());
        }
        Ok(())
    }
}
