//! Storefront entity and the closed locale mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::record::{Kind, RecordKey};
use crate::utils::product_url::{self, ProductUrlError, ROOT_URLS};

/// Errors raised while resolving a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store not found for locale: {0}")]
    UnknownLocale(String),

    #[error(transparent)]
    Url(#[from] ProductUrlError),
}

/// Reference to a storefront, identified by its root URL.
///
/// Counters and renderers hold this key rather than the store itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(String);

impl StoreKey {
    /// Resolves the store of a locale code (`us`, `uk`, `de`, `ca`, `fr`, `jp`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownLocale`] for any other code.
    pub fn for_locale(locale: &str) -> Result<Self, StoreError> {
        let root = match locale {
            "us" => "http://www.amazon.com",
            "uk" => "http://www.amazon.co.uk",
            "de" => "http://www.amazon.de",
            "ca" => "http://www.amazon.ca",
            "fr" => "http://www.amazon.fr",
            "jp" => "http://www.amazon.co.jp",
            other => return Err(StoreError::UnknownLocale(other.to_string())),
        };
        Ok(Self(root.to_string()))
    }

    /// Resolves the store a product URL belongs to.
    pub fn from_product_url(url: &str) -> Result<Self, StoreError> {
        Ok(Self(product_url::root_url(url)?))
    }

    /// Keys of every supported store.
    pub fn all() -> Vec<Self> {
        ROOT_URLS.iter().map(|root| Self(root.to_string())).collect()
    }

    pub fn root(&self) -> &str {
        &self.0
    }

    pub fn record_key(&self) -> RecordKey {
        RecordKey::from_path(Kind::Store, self.0.clone())
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the store of a locale code.
pub fn key_for_locale(locale: &str) -> Result<StoreKey, StoreError> {
    StoreKey::for_locale(locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_known_locales() {
        let cases = [
            ("us", "http://www.amazon.com"),
            ("uk", "http://www.amazon.co.uk"),
            ("de", "http://www.amazon.de"),
            ("ca", "http://www.amazon.ca"),
            ("fr", "http://www.amazon.fr"),
            ("jp", "http://www.amazon.co.jp"),
        ];

        for (locale, root) in cases {
            assert_eq!(key_for_locale(locale).unwrap().root(), root);
        }
    }

    #[test]
    fn test_unknown_locale_fails() {
        assert_eq!(
            key_for_locale("xx").unwrap_err(),
            StoreError::UnknownLocale("xx".to_string())
        );
    }

    #[test]
    fn test_from_product_url() {
        let store = StoreKey::from_product_url("http://www.amazon.fr/dp/B00ABCDEFG").unwrap();
        assert_eq!(store, key_for_locale("fr").unwrap());
        assert_eq!(store.record_key().cache_key(), "Store:http://www.amazon.fr");
    }

    #[test]
    fn test_all_stores() {
        let all = StoreKey::all();
        assert_eq!(all.len(), 6);
        assert!(all.contains(&key_for_locale("jp").unwrap()));
    }
}
