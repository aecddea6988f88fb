//! Mention ingestion.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::entities::{Counter, CounterKind, Product, TrackedUser, UrlRecord};
use crate::domain::frequency::Frequency;
use crate::domain::payload::Payload;
use crate::domain::record::{Kind, RecordKey};
use crate::error::AppError;
use crate::infrastructure::{Tier, TieredStorage};
use crate::utils::product_url;

use super::banlist_service::BanlistService;
use super::counter_service::CounterService;

/// Outcome of ingesting one payload batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Mentions counted for a product.
    pub counted: usize,
    /// Mentions whose URL is not a product page of a supported store, or
    /// whose product or user cannot be used as a key root.
    pub skipped: usize,
    /// Mentions dropped because the product or the user is banned.
    pub banned: usize,
}

/// Turns mention payloads into product and user counter increments.
pub struct IngestService {
    storage: Arc<TieredStorage>,
    counters: Arc<CounterService>,
    banlist: Arc<BanlistService>,
}

impl IngestService {
    pub fn new(
        storage: Arc<TieredStorage>,
        counters: Arc<CounterService>,
        banlist: Arc<BanlistService>,
    ) -> Self {
        Self {
            storage,
            counters,
            banlist,
        }
    }

    /// Decodes a serialized payload batch and processes it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Payload`] for malformed bodies; nothing is counted
    /// in that case.
    pub async fn ingest(&self, body: &str, date: NaiveDate) -> Result<IngestReport, AppError> {
        let payloads = Payload::deserialize(body)?;
        self.process(&payloads, date).await
    }

    /// Counts the product mentions of `payloads` on `date`.
    ///
    /// A payload URL is either a known short URL that resolved to a product
    /// page, or a product page itself. Other URLs are skipped, as are
    /// mentions whose product or user is not a valid key root. Mentions of
    /// banned products or by banned users are dropped. Every payload is
    /// checked before the first counter is written.
    pub async fn process(&self, payloads: &[Payload], date: NaiveDate) -> Result<IngestReport, AppError> {
        let mut report = IngestReport::default();
        let mut products: BTreeMap<String, u64> = BTreeMap::new();
        let mut users: BTreeMap<String, u64> = BTreeMap::new();

        for payload in payloads {
            let Some(product) = self.resolve_product(payload.url()).await? else {
                debug!(url = payload.url(), "not a product mention");
                report.skipped += 1;
                continue;
            };

            if !Self::countable(&product, payload.user_id(), date) {
                debug!(
                    product = %product,
                    user = payload.user_id(),
                    "mention not usable as counter key"
                );
                report.skipped += 1;
                continue;
            }

            if self.banlist.is_product_banned(&product).await?
                || self.banlist.is_user_banned(payload.user_id()).await?
            {
                report.banned += 1;
                continue;
            }

            *products.entry(product).or_default() += 1;
            *users.entry(payload.user_id().to_string()).or_default() += 1;
            report.counted += 1;
        }

        for (product, delta) in &products {
            self.storage
                .get_or_insert(Product::new(product.as_str(), date), Tier::Both)
                .await?;
            self.counters
                .increment(CounterKind::Product, product, date, *delta)
                .await?;
        }

        for (user, delta) in &users {
            self.storage
                .get_or_insert(TrackedUser::new(user.as_str(), date), Tier::Both)
                .await?;
            self.counters
                .increment(CounterKind::User, user, date, *delta)
                .await?;
        }

        metrics::counter!("payloads_ingested_total").increment(payloads.len() as u64);
        info!(
            counted = report.counted,
            skipped = report.skipped,
            banned = report.banned,
            products = products.len(),
            users = users.len(),
            "payload batch ingested"
        );
        Ok(report)
    }

    fn countable(product: &str, user: &str, date: NaiveDate) -> bool {
        Counter::new(CounterKind::Product, product, Frequency::Daily, date).is_ok()
            && Counter::new(CounterKind::User, user, Frequency::Daily, date).is_ok()
    }

    async fn resolve_product(&self, url: &str) -> Result<Option<String>, AppError> {
        let key = RecordKey::from_path(Kind::Url, url);
        if let Some(record) = self.storage.get::<UrlRecord>(&key, Tier::Both).await? {
            return Ok(if record.is_product() {
                record.product_url().ok()
            } else {
                None
            });
        }

        Ok(product_url::product_url(url).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::CounterRegistry;
    use crate::domain::entities::{Counter, CounterThresholds};
    use crate::domain::frequency::Frequency;
    use crate::infrastructure::cache::MemoryCache;
    use crate::infrastructure::persistence::MemoryRecordRepository;

    const PRODUCT: &str = "http://www.amazon.com/dp/B00ABCDEFG";

    struct Fixture {
        storage: Arc<TieredStorage>,
        counters: Arc<CounterService>,
        banlist: Arc<BanlistService>,
        ingest: IngestService,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(TieredStorage::new(
            Arc::new(MemoryCache::new(60)),
            Arc::new(MemoryRecordRepository::new()),
        ));
        let registry = Arc::new(CounterRegistry::new(storage.clone()));
        let counters = Arc::new(CounterService::new(
            storage.clone(),
            registry,
            CounterThresholds::default(),
        ));
        let banlist = Arc::new(BanlistService::new(storage.clone()));
        let ingest = IngestService::new(storage.clone(), counters.clone(), banlist.clone());
        Fixture {
            storage,
            counters,
            banlist,
            ingest,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    async fn count(f: &Fixture, kind: CounterKind, root: &str) -> Option<u64> {
        f.counters
            .get(kind, root, Frequency::Daily, date())
            .await
            .unwrap()
            .map(|c: Counter| c.count)
    }

    #[tokio::test]
    async fn test_counts_product_pages_and_users() {
        let f = fixture();
        let payloads = vec![
            Payload::new("https://www.amazon.com/Widget/dp/B00ABCDEFG/ref=x", "u1"),
            Payload::new("http://www.amazon.com/dp/B00ABCDEFG", "u2"),
            Payload::new("http://example.com/blog", "u1"),
        ];

        let report = f.ingest.process(&payloads, date()).await.unwrap();

        assert_eq!(report.counted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(count(&f, CounterKind::Product, PRODUCT).await, Some(2));
        assert_eq!(count(&f, CounterKind::User, "u1").await, Some(1));
        let product: Option<Product> = f
            .storage
            .get(&RecordKey::from_path(Kind::Product, PRODUCT), Tier::Durable)
            .await
            .unwrap();
        assert_eq!(product, Some(Product::new(PRODUCT, date())));
    }

    #[tokio::test]
    async fn test_resolves_short_urls() {
        let f = fixture();
        let mut record = UrlRecord::new("http://bit.ly/abc", None);
        record.resolve("https://www.amazon.com/gp/product/B00ABCDEFG");
        f.storage.set(&record, Tier::Both).await.unwrap();

        let report = f
            .ingest
            .process(&[Payload::new("http://bit.ly/abc", 7)], date())
            .await
            .unwrap();

        assert_eq!(report.counted, 1);
        assert_eq!(count(&f, CounterKind::Product, PRODUCT).await, Some(1));
        assert_eq!(count(&f, CounterKind::User, "7").await, Some(1));
    }

    #[tokio::test]
    async fn test_banned_product_not_counted() {
        let f = fixture();
        f.banlist.ban_products(vec![PRODUCT.to_string()]).await.unwrap();

        let report = f
            .ingest
            .process(&[Payload::new(PRODUCT, "u1")], date())
            .await
            .unwrap();

        assert_eq!(report.banned, 1);
        assert_eq!(report.counted, 0);
        assert_eq!(count(&f, CounterKind::Product, PRODUCT).await, None);
    }

    #[tokio::test]
    async fn test_banned_user_not_counted() {
        let f = fixture();
        f.banlist.ban_users(vec!["spammer".to_string()]).await.unwrap();

        let report = f
            .ingest
            .process(
                &[Payload::new(PRODUCT, "spammer"), Payload::new(PRODUCT, "u1")],
                date(),
            )
            .await
            .unwrap();

        assert_eq!(report.banned, 1);
        assert_eq!(count(&f, CounterKind::Product, PRODUCT).await, Some(1));
        assert_eq!(count(&f, CounterKind::User, "spammer").await, None);
    }

    #[tokio::test]
    async fn test_invalid_user_root_skipped_before_any_write() {
        let f = fixture();
        let payloads = vec![
            Payload::new(PRODUCT, "a|b"),
            Payload::new(PRODUCT, "u1"),
        ];

        let report = f.ingest.process(&payloads, date()).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.counted, 1);
        assert_eq!(count(&f, CounterKind::Product, PRODUCT).await, Some(1));
        assert_eq!(count(&f, CounterKind::User, "u1").await, Some(1));

        let only_invalid = vec![Payload::new(PRODUCT, "x|y")];
        let report = f.ingest.process(&only_invalid, date()).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(count(&f, CounterKind::Product, PRODUCT).await, Some(1));
    }

    #[tokio::test]
    async fn test_malformed_body_counts_nothing() {
        let f = fixture();

        let result = f.ingest.ingest("{not json", date()).await;

        assert!(matches!(result, Err(AppError::Payload(_))));
        assert_eq!(count(&f, CounterKind::Product, PRODUCT).await, None);
    }

    #[tokio::test]
    async fn test_ingest_decodes_body() {
        let f = fixture();
        let body = Payload::serialize(&[Payload::new(PRODUCT, "u1")]).unwrap();

        let report = f.ingest.ingest(&body, date()).await.unwrap();

        assert_eq!(report.counted, 1);
    }
}
