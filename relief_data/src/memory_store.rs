use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::{record::SyntheticRecord, store::{Document, RecordStore, StoreError}};

/// In-process collection, used by tests and for running without a database file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Stores a raw document as-is, without any shape checks.
    pub fn insert_document(&self, document: Document) -> Result<(), StoreError> {
        self.lock()?.push(document);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Document>>, StoreError> {
        self.documents.lock().map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn document_time(document: &Document) -> Option<DateTime<Utc>> {
    let raw = document.get("timestamp")?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok().map(|time| time.with_timezone(&Utc))
}

impl RecordStore for MemoryStore {
    fn clear(&self) -> Result<usize, StoreError> {
        let mut documents = self.lock()?;
        let removed = documents.len();
        documents.clear();
        Ok(removed)
    }

    fn insert_many(&self, records: &[SyntheticRecord]) -> Result<(), StoreError> {
        let mut new_documents = Vec::with_capacity(records.len());
        for record in records {
            new_documents.push(record.to_document()?);
        }
        self.lock()?.extend(new_documents);
        Ok(())
    }

    fn latest(&self, limit: usize) -> Result<Vec<Document>, StoreError> {
        let documents = self.lock()?;
        let mut indexed = documents.iter().enumerate().collect::<Vec<_>>();
        indexed.sort_by(|(ia, a), (ib, b)| document_time(b).cmp(&document_time(a)).then(ib.cmp(ia)));
        Ok(indexed.into_iter().take(limit).map(|(_, document)| document.clone()).collect())
    }

    fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Document>, StoreError> {
        let documents = self.lock()?;
        let mut in_range = documents
            .iter()
            .filter_map(|document| {
                let time = document_time(document)?;
                (time >= start && time <= end).then_some((time, document.clone()))
            })
            .collect::<Vec<_>>();
        in_range.sort_by_key(|(time, _)| *time);
        Ok(in_range.into_iter().map(|(_, document)| document).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn poisoned_lock_is_reported_not_hidden() {
        let store = Arc::new(MemoryStore::new());
        store.insert_document(serde_json::json!({ "region_name": "Delhi" })).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        let holder = store.clone();
        let _ = thread::spawn(move || {
            let _guard = holder.documents.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(StoreError::Unavailable(_))));
        assert!(store.is_empty().is_err());
        assert!(store.latest(5).is_err());
    }
}
