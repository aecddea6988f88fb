//! Amazon product URL helpers.
//!
//! Derives the storefront root, ASIN and canonical product URL from a final
//! (already expanded) URL. Only the six supported storefronts are accepted.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Storefront roots recognized by the tracker.
pub const ROOT_URLS: [&str; 6] = [
    "http://www.amazon.com",
    "http://www.amazon.co.uk",
    "http://www.amazon.de",
    "http://www.amazon.ca",
    "http://www.amazon.fr",
    "http://www.amazon.co.jp",
];

static ASIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:dp|gp/product|o/ASIN|exec/obidos/ASIN|gp/aw/d)/([A-Z0-9]{10})(?:[/?]|$)")
        .expect("ASIN pattern is valid")
});

/// Errors that can occur while deriving product information from a URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductUrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported storefront: {0}")]
    UnsupportedStore(String),

    #[error("No ASIN found in URL: {0}")]
    MissingAsin(String),
}

/// Returns the storefront root (`http://<host>`) of a product URL.
///
/// The scheme is always normalized to `http` so `https` links map onto the
/// same store.
///
/// # Errors
///
/// Returns [`ProductUrlError::InvalidFormat`] for unparsable URLs and
/// [`ProductUrlError::UnsupportedStore`] if the host is not a known storefront.
pub fn root_url(input: &str) -> Result<String, ProductUrlError> {
    let url = Url::parse(input).map_err(|e| ProductUrlError::InvalidFormat(e.to_string()))?;

    let host = url
        .host_str()
        .ok_or_else(|| ProductUrlError::InvalidFormat(input.to_string()))?
        .to_ascii_lowercase();

    let root = format!("http://{}", host);
    if !ROOT_URLS.contains(&root.as_str()) {
        return Err(ProductUrlError::UnsupportedStore(host));
    }

    Ok(root)
}

/// Extracts the 10-character ASIN from a product URL.
pub fn extract_asin(input: &str) -> Result<String, ProductUrlError> {
    let url = Url::parse(input).map_err(|e| ProductUrlError::InvalidFormat(e.to_string()))?;

    ASIN_PATTERN
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ProductUrlError::MissingAsin(input.to_string()))
}

/// Builds the canonical `<root>/dp/<ASIN>` URL of a product.
pub fn product_url(input: &str) -> Result<String, ProductUrlError> {
    let root = root_url(input)?;
    let asin = extract_asin(input)?;
    Ok(format!("{}/dp/{}", root, asin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_url_normalizes_scheme_and_case() {
        assert_eq!(
            root_url("https://WWW.AMAZON.CO.UK/dp/B000000001").unwrap(),
            "http://www.amazon.co.uk"
        );
    }

    #[test]
    fn test_root_url_rejects_unknown_store() {
        assert!(matches!(
            root_url("http://www.example.com/dp/B000000001"),
            Err(ProductUrlError::UnsupportedStore(_))
        ));
    }

    #[test]
    fn test_root_url_rejects_garbage() {
        assert!(matches!(
            root_url("not a url"),
            Err(ProductUrlError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_extract_asin_variants() {
        let urls = [
            "http://www.amazon.com/dp/B00ABCDEFG",
            "http://www.amazon.com/Some-Title/dp/B00ABCDEFG/ref=sr_1_1",
            "http://www.amazon.com/gp/product/B00ABCDEFG?tag=x",
            "http://www.amazon.com/exec/obidos/ASIN/B00ABCDEFG/",
        ];

        for url in urls {
            assert_eq!(extract_asin(url).unwrap(), "B00ABCDEFG", "{url}");
        }
    }

    #[test]
    fn test_extract_asin_missing() {
        assert!(matches!(
            extract_asin("http://www.amazon.com/gp/help"),
            Err(ProductUrlError::MissingAsin(_))
        ));
    }

    #[test]
    fn test_product_url() {
        assert_eq!(
            product_url("https://www.amazon.de/Buch-Titel/dp/3442236851/ref=x").unwrap(),
            "http://www.amazon.de/dp/3442236851"
        );
    }
}
