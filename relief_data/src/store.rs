use chrono::{DateTime, SecondsFormat, Utc};

use crate::record::SyntheticRecord;

pub const COLLECTION_NAME: &str = "gan_data";
pub const DEFAULT_STORE_PATH: &str = "resource_allocation.db";

pub type Document = serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("invalid document: {0}")]
    Validation(String),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// A single collection of record documents.
///
/// Each method is atomic on its own. Nothing spans two calls, so a reader
/// that lands between `clear` and `insert_many` sees an empty collection.
pub trait RecordStore: Send + Sync {
    fn clear(&self) -> Result<usize, StoreError>;

    fn insert_many(&self, records: &[SyntheticRecord]) -> Result<(), StoreError>;

    /// Newest documents first, by timestamp then insertion order.
    fn latest(&self, limit: usize) -> Result<Vec<Document>, StoreError>;

    /// Documents with `start <= timestamp <= end`, oldest first.
    fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Document>, StoreError>;

    fn replace_batch(&self, records: &[SyntheticRecord]) -> Result<(), StoreError> {
        self.clear()?;
        self.insert_many(records)
    }
}

/// Fixed-width UTC timestamp whose string order matches time order.
pub fn timestamp_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
