//! Products and users seen in mentions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::record::{Kind, Record, RecordKey};

/// A product first sighted on `add_date`. Keyed by its canonical product URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub key: String,
    pub add_date: NaiveDate,
}

impl Product {
    pub fn new(key: impl Into<String>, add_date: NaiveDate) -> Self {
        Self {
            key: key.into(),
            add_date,
        }
    }
}

impl Record for Product {
    fn record_key(&self) -> RecordKey {
        RecordKey::from_path(Kind::Product, self.key.clone())
    }

    fn add_date(&self) -> Option<NaiveDate> {
        Some(self.add_date)
    }
}

/// A user first sighted on `add_date`. Keyed by the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedUser {
    pub key: String,
    pub add_date: NaiveDate,
}

impl TrackedUser {
    pub fn new(key: impl Into<String>, add_date: NaiveDate) -> Self {
        Self {
            key: key.into(),
            add_date,
        }
    }
}

impl Record for TrackedUser {
    fn record_key(&self) -> RecordKey {
        RecordKey::from_path(Kind::TrackedUser, self.key.clone())
    }

    fn add_date(&self) -> Option<NaiveDate> {
        Some(self.add_date)
    }
}
