use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use relief_data::{reader, RecordStore, Resource, SqliteDocumentStore, StoreError, SyntheticRecord};

fn record(id: u8, name: &str, timestamp: DateTime<Utc>) -> SyntheticRecord {
    SyntheticRecord {
        region_id: id,
        region_name: name.to_string(),
        population_density: 200_000 + u64::from(id),
        road_block_status: u32::from(id),
        severity_score: 12.5 * f64::from(id),
        warehouse_stock_status: BTreeMap::from([(Resource::Food, 900.0), (Resource::Water, 1800.0), (Resource::Medical, 450.0)]),
        resource_needs: BTreeMap::from([(Resource::Food, 1000.0), (Resource::Water, 0.0), (Resource::Medical, 300.0)]),
        timestamp,
    }
}

fn batch(timestamp: DateTime<Utc>) -> Vec<SyntheticRecord> {
    ["Delhi", "Mumbai", "Chennai", "Hyderabad", "Bangalore"]
        .iter()
        .enumerate()
        .map(|(i, name)| record(i as u8, name, timestamp + Duration::microseconds(i as i64)))
        .collect()
}

#[test]
fn replace_batch_keeps_only_the_newest_batch() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteDocumentStore::open(dir.path().join("relief.db")).unwrap();

    let first = Utc::now();
    store.replace_batch(&batch(first)).unwrap();
    store.replace_batch(&batch(first + Duration::seconds(3))).unwrap();

    let latest = reader::try_load_latest(&store).unwrap();
    assert_eq!(latest.len(), 5);
    assert!(latest.iter().all(|r| r.timestamp >= first + Duration::seconds(3)));
    assert_eq!(latest[0].region_name, "Bangalore");
    assert_eq!(latest[4], batch(first + Duration::seconds(3))[0]);
}

#[test]
fn range_query_is_bounded_and_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteDocumentStore::open(dir.path().join("relief.db")).unwrap();
    let now = Utc::now();
    store.insert_many(&[record(0, "Delhi", now - Duration::hours(10))]).unwrap();
    store.insert_many(&[record(1, "Mumbai", now - Duration::hours(5))]).unwrap();
    store.insert_many(&[record(2, "Chennai", now - Duration::hours(1))]).unwrap();

    let history = reader::try_load_history(&store, 6, now).unwrap();
    let names = history.iter().map(|r| r.region_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Mumbai", "Chennai"]);
}

#[test]
fn clear_reports_removed_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteDocumentStore::open(dir.path().join("relief.db")).unwrap();
    store.insert_many(&batch(Utc::now())).unwrap();
    assert_eq!(store.clear().unwrap(), 5);
    assert!(reader::load_latest(&store).is_empty());
}

#[test]
fn data_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relief.db");
    {
        let store = SqliteDocumentStore::open(&path).unwrap();
        store.insert_many(&batch(Utc::now())).unwrap();
    }
    let reader_store = SqliteDocumentStore::connect_lazy(&path);
    assert_eq!(reader::load_latest(&reader_store).len(), 5);
}

#[test]
fn unreachable_path_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteDocumentStore::connect_lazy(dir.path().join("missing").join("relief.db"));
    let err = store.replace_batch(&batch(Utc::now())).unwrap_err();
    assert!(err.is_unavailable(), "unexpected error: {err}");
    assert!(matches!(SqliteDocumentStore::open(dir.path().join("missing").join("x.db")), Err(StoreError::Unavailable(_))));
}

#[test]
fn malformed_document_is_rejected_by_reader() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteDocumentStore::open(dir.path().join("relief.db")).unwrap();
    let now = Utc::now();
    store.insert_document("Delhi", &now, &serde_json::json!({ "region_name": "Delhi", "timestamp": now })).unwrap();

    let err = reader::try_load_latest(&store).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(reader::load_latest(&store).is_empty());
}
