//! Moderation blocklist.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::record::{Kind, Record, RecordKey};

pub const BANLIST_KEY: &str = "banlist";

/// Banned product and user keys. Exactly one instance exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banlist {
    pub products: BTreeSet<String>,
    pub users: BTreeSet<String>,
}

impl Banlist {
    pub fn new(
        products: impl IntoIterator<Item = String>,
        users: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            products: products.into_iter().collect(),
            users: users.into_iter().collect(),
        }
    }

    pub fn key() -> RecordKey {
        RecordKey::from_path(Kind::Banlist, BANLIST_KEY)
    }

    pub fn is_product_banned(&self, product_key: &str) -> bool {
        self.products.contains(product_key)
    }

    pub fn is_user_banned(&self, user_key: &str) -> bool {
        self.users.contains(user_key)
    }
}

impl Record for Banlist {
    fn record_key(&self) -> RecordKey {
        Self::key()
    }
}
