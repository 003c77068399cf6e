use chrono::{DateTime, Duration, Utc};
use tracing::error;

use crate::{record::SyntheticRecord, store::{Document, RecordStore, StoreError}};

pub const LATEST_BATCH_SIZE: usize = 5;

pub fn decode_documents(documents: Vec<Document>) -> Result<Vec<SyntheticRecord>, StoreError> {
    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        if let Some(field) = SyntheticRecord::missing_field(&document) {
            return Err(StoreError::Validation(format!("missing required column in data: {field}")));
        }
        let record = serde_json::from_value::<SyntheticRecord>(document)
            .map_err(|e| StoreError::Validation(format!("malformed record: {e}")))?;
        records.push(record);
    }
    Ok(records)
}

pub fn try_load_latest(store: &dyn RecordStore) -> Result<Vec<SyntheticRecord>, StoreError> {
    decode_documents(store.latest(LATEST_BATCH_SIZE)?)
}

pub fn try_load_history(store: &dyn RecordStore, hours: i64, now: DateTime<Utc>) -> Result<Vec<SyntheticRecord>, StoreError> {
    let start = Duration::try_hours(hours.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| StoreError::Validation(format!("history window of {hours} hours is out of range")))?;
    decode_documents(store.range(start, now)?)
}

/// Latest batch, or an empty vec if the store fails or a document is malformed.
pub fn load_latest(store: &dyn RecordStore) -> Vec<SyntheticRecord> {
    match try_load_latest(store) {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "data loading error");
            Vec::new()
        }
    }
}

pub fn load_history(store: &dyn RecordStore, hours: i64) -> Vec<SyntheticRecord> {
    match try_load_history(store, hours, Utc::now()) {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, hours, "error loading historical data");
            Vec::new()
        }
    }
}
