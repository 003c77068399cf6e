use std::{sync::Arc, time::Duration};

use gan::SyntheticGenerator;
use rand::Rng;
use relief_data::RecordStore;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const TICK_INTERVAL: Duration = Duration::from_secs(3);
pub const STORE_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    pub interval: Duration,
    /// Pause after the store reports it is unreachable.
    pub backoff: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig { interval: TICK_INTERVAL, backoff: STORE_BACKOFF }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub written: u64,
    pub skipped: u64,
    pub failures: u64,
}

/// Sleeps for `pause`, returning true if the stop signal fired first.
async fn sleep_unless_stopped(pause: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(pause);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}

/// Generates a batch every tick and replaces the stored batch with it.
///
/// Storage failures never end the loop; only the stop signal (or its sender
/// going away) does.
pub async fn run_persistence_loop<R: Rng>(
    mut generator: SyntheticGenerator<R>,
    store: Arc<dyn RecordStore>,
    config: LoopConfig,
    mut shutdown: watch::Receiver<bool>,
) -> LoopStats {
    let mut stats = LoopStats::default();
    while !*shutdown.borrow() {
        stats.ticks += 1;
        let batch = generator.generate();
        let pause = if batch.is_empty() {
            warn!(tick = stats.ticks, "no data generated, skipping tick");
            stats.skipped += 1;
            config.interval
        } else {
            match store.replace_batch(&batch) {
                Ok(()) => {
                    stats.written += 1;
                    info!(tick = stats.ticks, records = batch.len(), "stored new batch");
                    config.interval
                }
                Err(e) if e.is_unavailable() => {
                    stats.failures += 1;
                    warn!(error = %e, backoff_secs = config.backoff.as_secs_f64(), "store unreachable, retrying");
                    config.backoff
                }
                Err(e) => {
                    stats.failures += 1;
                    error!(error = %e, "failed to store batch");
                    config.interval
                }
            }
        };
        if sleep_unless_stopped(pause, &mut shutdown).await {
            break;
        }
    }
    stats
}
