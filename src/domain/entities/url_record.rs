//! Short URL to final URL mapping.

use serde::{Deserialize, Serialize};

use crate::domain::record::{Kind, Record, RecordKey};
use crate::utils::product_url::{self, ProductUrlError};

/// A shortened URL and what it resolved to, keyed by the short URL.
///
/// `is_valid` is set once the final URL was fetched; `is_product` only when
/// the final URL is a product page of a supported store, so `is_product`
/// always implies `is_valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub short_url: String,
    pub final_url: Option<String>,
    pub user_id: Option<String>,
    is_valid: bool,
    is_product: bool,
}

impl UrlRecord {
    /// Creates an unresolved record.
    pub fn new(short_url: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            short_url: short_url.into(),
            final_url: None,
            user_id,
            is_valid: false,
            is_product: false,
        }
    }

    /// Records the final URL the short URL redirected to.
    pub fn resolve(&mut self, final_url: impl Into<String>) {
        let final_url = final_url.into();
        self.is_product = product_url::product_url(&final_url).is_ok();
        self.final_url = Some(final_url);
        self.is_valid = true;
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn is_product(&self) -> bool {
        self.is_product
    }

    fn final_url(&self) -> Result<&str, ProductUrlError> {
        self.final_url
            .as_deref()
            .ok_or_else(|| ProductUrlError::InvalidFormat(format!("{} is unresolved", self.short_url)))
    }

    pub fn asin(&self) -> Result<String, ProductUrlError> {
        product_url::extract_asin(self.final_url()?)
    }

    pub fn product_url(&self) -> Result<String, ProductUrlError> {
        product_url::product_url(self.final_url()?)
    }

    pub fn root_url(&self) -> Result<String, ProductUrlError> {
        product_url::root_url(self.final_url()?)
    }
}

impl Record for UrlRecord {
    fn record_key(&self) -> RecordKey {
        RecordKey::from_path(Kind::Url, self.short_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_record() {
        let record = UrlRecord::new("http://bit.ly/abc", Some("42".to_string()));
        assert!(!record.is_valid());
        assert!(!record.is_product());
        assert!(record.product_url().is_err());
    }

    #[test]
    fn test_resolved_product() {
        let mut record = UrlRecord::new("http://bit.ly/abc", None);
        record.resolve("https://www.amazon.com/Widget/dp/B00ABCDEFG/ref=foo");

        assert!(record.is_valid());
        assert!(record.is_product());
        assert_eq!(record.asin().unwrap(), "B00ABCDEFG");
        assert_eq!(
            record.product_url().unwrap(),
            "http://www.amazon.com/dp/B00ABCDEFG"
        );
        assert_eq!(record.root_url().unwrap(), "http://www.amazon.com");
    }

    #[test]
    fn test_resolved_non_product_is_valid_only() {
        let mut record = UrlRecord::new("http://bit.ly/xyz", None);
        record.resolve("https://example.com/blog");

        assert!(record.is_valid());
        assert!(!record.is_product());
    }
}
