//! Singleton bookkeeping for the consolidation job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::record::{Kind, Record, RecordKey};

pub const OPERATION_FLAGS_KEY: &str = "OperationFlags";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFlags {
    pub last_consolidation: Option<DateTime<Utc>>,
    pub last_flushed: u64,
}

impl OperationFlags {
    pub fn key() -> RecordKey {
        RecordKey::from_path(Kind::OperationFlags, OPERATION_FLAGS_KEY)
    }
}

impl Record for OperationFlags {
    fn record_key(&self) -> RecordKey {
        Self::key()
    }
}
