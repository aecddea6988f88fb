//! Record identity shared by both storage tiers.
//!
//! Every stored record is addressed by a [`RecordKey`] made of its [`Kind`]
//! and a key name. The volatile tier flattens it into a single string
//! (`Kind:name`), the durable tier keeps the two parts as separate columns.

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;

/// Record kinds known to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    ProductCounter,
    UserCounter,
    ProductRenderer,
    Product,
    TrackedUser,
    Url,
    Store,
    Banlist,
    OperationFlags,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::ProductCounter => "ProductCounter",
            Kind::UserCounter => "UserCounter",
            Kind::ProductRenderer => "ProductRenderer",
            Kind::Product => "Product",
            Kind::TrackedUser => "TrackedUser",
            Kind::Url => "Url",
            Kind::Store => "Store",
            Kind::Banlist => "Banlist",
            Kind::OperationFlags => "OperationFlags",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ProductCounter" => Kind::ProductCounter,
            "UserCounter" => Kind::UserCounter,
            "ProductRenderer" => Kind::ProductRenderer,
            "Product" => Kind::Product,
            "TrackedUser" => Kind::TrackedUser,
            "Url" => Kind::Url,
            "Store" => Kind::Store,
            "Banlist" => Kind::Banlist,
            "OperationFlags" => Kind::OperationFlags,
            other => return Err(format!("unknown record kind: {}", other)),
        })
    }
}

/// Full path of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub kind: Kind,
    pub name: String,
}

impl RecordKey {
    /// Builds a key from its kind and name.
    pub fn from_path(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Flattened form used as the volatile-tier key.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.kind, self.name)
    }

    /// Parses a flattened volatile-tier key back into a record key.
    pub fn parse_cache_key(cache_key: &str) -> Option<Self> {
        let (kind, name) = cache_key.split_once(':')?;
        let kind = kind.parse().ok()?;
        if name.is_empty() {
            return None;
        }
        Some(Self::from_path(kind, name))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// A record that can be stored on either tier.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    fn record_key(&self) -> RecordKey;

    /// Date the durable tier orders keys-only queries by.
    fn add_date(&self) -> Option<NaiveDate> {
        None
    }
}
