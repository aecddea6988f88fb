//! Read-optimized product views.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entities::store::StoreKey;
use crate::domain::frequency::{Frequency, FrequencyKey};
use crate::domain::record::{Kind, Record, RecordKey};
use crate::error::AppError;
use crate::utils::product_url;

/// Attributes a renderer carries over from a sibling-frequency renderer.
///
/// Bucket fields (day, week, month, year) and the count are excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererAttributes {
    pub store: Option<StoreKey>,
    pub url: Option<String>,
    pub image_small: Option<String>,
    pub image_medium: Option<String>,
    pub image_large: Option<String>,
    pub product_group: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub is_ban_synched: bool,
}

/// Snapshot of a product at one frequency bucket.
///
/// Never the source of truth for counts; the count is copied in from the
/// product counter when the view is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRenderer {
    pub key: FrequencyKey,
    #[serde(flatten)]
    pub attributes: RendererAttributes,
    #[serde(default)]
    pub count: u64,
}

impl ProductRenderer {
    /// Creates a renderer whose url and store are derived from the product key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ProductUrl`] if the key is not a product URL of a
    /// supported store.
    pub fn new(product_key: &str, frequency: Frequency, date: NaiveDate) -> Result<Self, AppError> {
        let attributes = RendererAttributes {
            store: Some(StoreKey::from_product_url(product_key)?),
            url: Some(product_url::product_url(product_key)?),
            ..RendererAttributes::default()
        };

        Self::with_attributes(product_key, frequency, date, 0, attributes)
    }

    /// Creates a renderer from previously cloned attributes.
    pub fn with_attributes(
        product_key: &str,
        frequency: Frequency,
        date: NaiveDate,
        count: u64,
        attributes: RendererAttributes,
    ) -> Result<Self, AppError> {
        Ok(Self {
            key: FrequencyKey::new(product_key, frequency, date)?,
            attributes,
            count,
        })
    }

    pub fn key_for(product_key: &str, frequency: Frequency, date: NaiveDate) -> Result<RecordKey, AppError> {
        let key = FrequencyKey::new(product_key, frequency, date)?;
        Ok(RecordKey::from_path(Kind::ProductRenderer, key.key_name()))
    }

    /// Copies every attribute except the bucket fields and the count.
    pub fn clone_properties(&self) -> RendererAttributes {
        self.attributes.clone()
    }
}

impl Record for ProductRenderer {
    fn record_key(&self) -> RecordKey {
        RecordKey::from_path(Kind::ProductRenderer, self.key.key_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: &str = "http://www.amazon.co.uk/dp/B00ABCDEFG";

    #[test]
    fn test_new_derives_url_and_store() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let renderer = ProductRenderer::new(PRODUCT, Frequency::Weekly, date).unwrap();

        assert_eq!(renderer.attributes.url.as_deref(), Some(PRODUCT));
        assert_eq!(
            renderer.attributes.store.as_ref().map(StoreKey::root),
            Some("http://www.amazon.co.uk")
        );
        assert_eq!(renderer.count, 0);
        assert_eq!(renderer.key.week(), Some(1));
    }

    #[test]
    fn test_clone_properties_excludes_bucket_and_count() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut renderer = ProductRenderer::new(PRODUCT, Frequency::Daily, date).unwrap();
        renderer.count = 99;
        renderer.attributes.title = Some("Widget".to_string());
        renderer.attributes.is_banned = true;

        let props = renderer.clone_properties();
        let rebuilt =
            ProductRenderer::with_attributes(PRODUCT, Frequency::Monthly, date, 4, props).unwrap();

        assert_eq!(rebuilt.attributes, renderer.attributes);
        assert_eq!(rebuilt.count, 4);
        assert_eq!(rebuilt.key.month(), Some(1));
        assert_eq!(rebuilt.key.day(), None);
    }
}
