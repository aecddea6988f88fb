//! Utility functions shared across layers.
//!
//! - [`product_url`] - Storefront root, ASIN and canonical product URL derivation

pub mod product_url;
