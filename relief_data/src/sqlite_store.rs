use std::{path::{Path, PathBuf}, sync::Mutex, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, warn};

use crate::{record::SyntheticRecord, store::{timestamp_key, Document, RecordStore, StoreError}};

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Document collection kept as JSON text in a SQLite table.
///
/// The connection is opened lazily and dropped whenever SQLite reports a
/// connectivity-type failure, so the next call reconnects.
#[derive(Debug)]
pub struct SqliteDocumentStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteDocumentStore {
    /// Opens the store and connects immediately.
    pub fn open(path: impl AsRef<Path>) -> Result<SqliteDocumentStore, StoreError> {
        let store = SqliteDocumentStore::connect_lazy(path);
        store.with_connection(|_| Ok(()))?;
        Ok(store)
    }

    /// Creates the store without touching the database; the first operation connects.
    pub fn connect_lazy(path: impl AsRef<Path>) -> SqliteDocumentStore {
        SqliteDocumentStore {
            path: path.as_ref().to_path_buf(),
            conn: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        debug!(path = %self.path.display(), "connecting to document store");
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS gan_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                region_name TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                document TEXT NOT NULL
            );",
        )?;
        Ok(conn)
    }

    fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>) -> Result<T, StoreError> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
        if guard.is_none() {
            let conn = self.connect().map_err(|e| StoreError::Unavailable(format!("{}: {e}", self.path.display())))?;
            *guard = Some(conn);
        }
        let Some(conn) = guard.as_mut() else {
            return Err(StoreError::Unavailable("no connection".to_string()));
        };
        match f(conn) {
            Ok(value) => Ok(value),
            Err(e) if is_connectivity_error(&e) => {
                warn!(path = %self.path.display(), error = %e, "dropping document store connection");
                *guard = None;
                Err(StoreError::Unavailable(e.to_string()))
            }
            Err(e) => Err(StoreError::Query(e.to_string())),
        }
    }
}

fn is_connectivity_error(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(
            ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
        )
    )
}

fn parse_documents(raw: Vec<String>) -> Result<Vec<Document>, StoreError> {
    raw.iter()
        .map(|text| serde_json::from_str::<Document>(text).map_err(|e| StoreError::Validation(format!("undecodable document: {e}"))))
        .collect()
}

impl RecordStore for SqliteDocumentStore {
    fn clear(&self) -> Result<usize, StoreError> {
        self.with_connection(|conn| conn.execute("DELETE FROM gan_data", []))
    }

    fn insert_many(&self, records: &[SyntheticRecord]) -> Result<(), StoreError> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            rows.push((record.region_name.clone(), timestamp_key(&record.timestamp), serde_json::to_string(record)?));
        }
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            for (region_name, timestamp, document) in &rows {
                tx.execute(
                    "INSERT INTO gan_data (region_name, timestamp, document) VALUES (?1, ?2, ?3)",
                    params![region_name, timestamp, document],
                )?;
            }
            tx.commit()
        })
    }

    fn latest(&self, limit: usize) -> Result<Vec<Document>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let raw = self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT document FROM gan_data ORDER BY timestamp DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        parse_documents(raw)
    }

    fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Document>, StoreError> {
        let (start, end) = (timestamp_key(&start), timestamp_key(&end));
        let raw = self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT document FROM gan_data
                 WHERE timestamp >= ?1 AND timestamp <= ?2
                 ORDER BY timestamp ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![start, end], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        parse_documents(raw)
    }
}

impl SqliteDocumentStore {
    /// Inserts a raw JSON document, bypassing record serialization.
    pub fn insert_document(&self, region_name: &str, timestamp: &DateTime<Utc>, document: &Document) -> Result<(), StoreError> {
        let text = serde_json::to_string(document)?;
        let timestamp = timestamp_key(timestamp);
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO gan_data (region_name, timestamp, document) VALUES (?1, ?2, ?3)",
                params![region_name, timestamp, text],
            )
        })?;
        Ok(())
    }
}
