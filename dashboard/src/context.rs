use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use relief_data::{reader, RecordStore, SyntheticRecord};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::PORT;

pub const CACHE_TTL: Duration = Duration::from_secs(10);
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(3);
pub const TREND_HOURS: i64 = 6;
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub port: u16,
    /// How long a store read is reused before hitting the store again.
    pub cache_ttl: Duration,
    pub refresh_interval: Duration,
    pub trend_hours: i64,
    /// Sessions that have not asked for a frame this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            port: PORT,
            cache_ttl: CACHE_TTL,
            refresh_interval: REFRESH_INTERVAL,
            trend_hours: TREND_HOURS,
            session_idle_timeout: SESSION_IDLE_TIMEOUT,
        }
    }
}

/// Everything one frame is rendered from.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<SyntheticRecord>,
    pub history: Vec<SyntheticRecord>,
    pub warnings: Vec<String>,
}

struct CachedSnapshot {
    snapshot: Snapshot,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct SessionState {
    pub previous: Option<Vec<SyntheticRecord>>,
    pub frames_served: u64,
    pub last_seen: Instant,
}

impl SessionState {
    fn new() -> SessionState {
        SessionState { previous: None, frames_served: 0, last_seen: Instant::now() }
    }
}

pub struct DashboardContext {
    pub store: Arc<dyn RecordStore>,
    pub config: DashboardConfig,
    pub sessions: HashMap<String, SessionState>,
    cache: Option<CachedSnapshot>,
}

pub type DashboardContextRef = Arc<RwLock<DashboardContext>>;

impl DashboardContext {
    pub fn new(store: Arc<dyn RecordStore>, config: DashboardConfig) -> DashboardContext {
        DashboardContext {
            store,
            config,
            sessions: HashMap::new(),
            cache: None,
        }
    }

    pub fn create_session(&mut self) -> String {
        self.evict_idle_sessions();
        let id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(id.clone(), SessionState::new());
        id
    }

    pub fn evict_idle_sessions(&mut self) {
        let timeout = self.config.session_idle_timeout;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_seen.elapsed() < timeout);
        let evicted = before - self.sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.sessions.len(), "dropped idle sessions");
        }
    }

    fn cached_snapshot(&self) -> Option<Snapshot> {
        let cached = self.cache.as_ref()?;
        (cached.fetched_at.elapsed() < self.config.cache_ttl).then(|| cached.snapshot.clone())
    }
}

/// Cached snapshot, or a fresh read on a blocking thread when the cache is stale.
///
/// The context lock is not held while the store is read.
pub async fn load_snapshot(context_ref: &DashboardContextRef) -> Snapshot {
    let (store, trend_hours) = {
        let context = context_ref.read().await;
        if let Some(snapshot) = context.cached_snapshot() {
            return snapshot;
        }
        (context.store.clone(), context.config.trend_hours)
    };

    let snapshot = match tokio::task::spawn_blocking(move || fetch_snapshot(store.as_ref(), trend_hours)).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "store read task failed");
            Snapshot { warnings: vec![format!("Data loading error: {e}")], ..Snapshot::default() }
        }
    };
    context_ref.write().await.cache = Some(CachedSnapshot { snapshot: snapshot.clone(), fetched_at: Instant::now() });
    snapshot
}

fn fetch_snapshot(store: &dyn RecordStore, trend_hours: i64) -> Snapshot {
    let mut warnings = Vec::new();
    let mut records = match reader::try_load_latest(store) {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "data loading error");
            warnings.push(format!("Data loading error: {e}"));
            Vec::new()
        }
    };
    records.sort_by_key(|record| record.region_id);

    let history = match reader::try_load_history(store, trend_hours, Utc::now()) {
        Ok(history) => history,
        Err(e) => {
            warn!(error = %e, "could not load trend history");
            warnings.push(format!("Could not add historical data: {e}"));
            Vec::new()
        }
    };
    Snapshot { records, history, warnings }
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Mutex};

    use chrono::DateTime;
    use relief_data::{Document, MemoryStore, StoreError};

    use super::*;

    /// Holds `latest` until the test releases it.
    struct GatedStore {
        inner: MemoryStore,
        started: Mutex<mpsc::Sender<()>>,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl RecordStore for GatedStore {
        fn clear(&self) -> Result<usize, StoreError> {
            self.inner.clear()
        }

        fn insert_many(&self, records: &[SyntheticRecord]) -> Result<(), StoreError> {
            self.inner.insert_many(records)
        }

        fn latest(&self, limit: usize) -> Result<Vec<Document>, StoreError> {
            let _ = self.started.lock().unwrap().send(());
            let _ = self.gate.lock().unwrap().recv();
            self.inner.latest(limit)
        }

        fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Document>, StoreError> {
            self.inner.range(start, end)
        }
    }

    fn context(idle_timeout: Duration) -> DashboardContext {
        let config = DashboardConfig { session_idle_timeout: idle_timeout, ..DashboardConfig::default() };
        DashboardContext::new(Arc::new(MemoryStore::new()), config)
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_evicted() {
        let mut context = context(Duration::from_secs(60));
        let stale = context.create_session();
        let active = context.create_session();

        tokio::time::advance(Duration::from_secs(45)).await;
        if let Some(session) = context.sessions.get_mut(&active) {
            session.last_seen = Instant::now();
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        let fresh = context.create_session();
        assert!(!context.sessions.contains_key(&stale));
        assert!(context.sessions.contains_key(&active));
        assert!(context.sessions.contains_key(&fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn session_count_stays_bounded_under_churn() {
        let mut context = context(Duration::from_secs(60));
        for _ in 0..1000 {
            context.create_session();
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        assert!(context.sessions.len() <= 61, "held {} sessions", context.sessions.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn store_reads_do_not_hold_the_context_lock() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release, gate) = mpsc::channel();
        let store = GatedStore { inner: MemoryStore::new(), started: Mutex::new(started_tx), gate: Mutex::new(gate) };
        let context_ref: DashboardContextRef =
            Arc::new(RwLock::new(DashboardContext::new(Arc::new(store), DashboardConfig::default())));

        let loading = tokio::spawn({
            let context_ref = context_ref.clone();
            async move { load_snapshot(&context_ref).await }
        });
        tokio::task::spawn_blocking(move || started_rx.recv()).await.unwrap().unwrap();

        // the store is mid-read here
        let session = tokio::time::timeout(Duration::from_secs(5), async { context_ref.write().await.create_session() })
            .await
            .expect("context lock held across a store read");
        release.send(()).unwrap();
        drop(release);

        let snapshot = loading.await.unwrap();
        assert!(snapshot.records.is_empty());
        assert!(context_ref.read().await.sessions.contains_key(&session));
    }
}
