use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{KeyValueStore, LinkMonitor, Resolver, TimeSource};
use crate::domain::{timezone, SyncReport, SyncState, SyncStatus};
use crate::error::SyncError;
use crate::sync::SystemClock;

use super::persistence::{PersistedTime, Persistence};
use super::pool::ServerPool;

pub const BASE_BACKOFF: Duration = Duration::from_millis(1000);
pub const MAX_BACKOFF: Duration = Duration::from_millis(60_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before retrying a server after `failure_count` consecutive failures:
/// `min(1s * 2^(failure_count - 1), 60s)`.
pub fn backoff_delay(failure_count: u32) -> Duration {
    let exponent = failure_count.max(1) - 1;
    2u32.checked_pow(exponent)
        .and_then(|factor| BASE_BACKOFF.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Everything the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub link: Arc<dyn LinkMonitor>,
    pub resolver: Arc<dyn Resolver>,
    pub source: Arc<dyn TimeSource>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn SystemClock>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Queries per server before failing over to the next one.
    pub max_retries: u32,
    pub query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

struct Inner {
    pool: ServerPool,
    state: SyncState,
}

/// Runs synchronization attempts over a server pool.
///
/// Pool and state sit behind one async mutex that is held for a whole
/// attempt, network waits and backoff sleeps included, so configuration
/// and status reads never observe a half-finished attempt.
pub struct SyncEngine {
    inner: Mutex<Inner>,
    link: Arc<dyn LinkMonitor>,
    resolver: Arc<dyn Resolver>,
    source: Arc<dyn TimeSource>,
    clock: Arc<dyn SystemClock>,
    persistence: Persistence,
    config: EngineConfig,
}

impl SyncEngine {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        let Collaborators {
            link,
            resolver,
            source,
            store,
            clock,
        } = collaborators;
        Self {
            inner: Mutex::new(Inner {
                pool: ServerPool::default(),
                state: SyncState::default(),
            }),
            link,
            resolver,
            source,
            clock,
            persistence: Persistence::new(store),
            config,
        }
    }

    /// Replace timezone and server list. Resets the sync state.
    pub async fn configure<I, S>(&self, timezone_id: &str, servers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.lock().await;
        inner.pool.configure(servers);
        inner.state = SyncState::new(timezone_id);
        inner.state.update_dst(Utc::now());
        if !timezone::is_known(timezone_id) {
            warn!(timezone = timezone_id, "unknown timezone, using UTC offset 0");
        }
        info!(
            timezone = timezone_id,
            offset = inner.state.utc_offset_seconds,
            dst = inner.state.dst_active,
            servers = inner.pool.len(),
            "configured"
        );
    }

    /// Seed the clock from the persisted last sync, if there is one.
    ///
    /// The persisted offset is only adopted when the configured timezone is
    /// not in the table.
    pub async fn restore(&self) -> PersistedTime {
        let mut inner = self.inner.lock().await;
        let persisted = self.persistence.load(inner.state.utc_offset_seconds);
        if !timezone::is_known(&inner.state.timezone_id) {
            inner.state.utc_offset_seconds = persisted.utc_offset_seconds;
        }
        if persisted.last_sync_epoch > 0 {
            match self.clock.set_epoch(persisted.last_sync_epoch) {
                Ok(()) => info!(
                    epoch = persisted.last_sync_epoch,
                    time = %format_epoch(persisted.last_sync_epoch),
                    "clock seeded from last sync"
                ),
                Err(e) => warn!(error = %e, "could not seed clock from last sync"),
            }
            inner.state.last_sync_epoch = persisted.last_sync_epoch;
        } else {
            debug!("no persisted sync");
        }
        persisted
    }

    /// One full synchronization attempt over the pool.
    #[instrument(skip(self), name = "attempt_sync")]
    pub async fn attempt_sync(&self) -> Result<SyncReport, SyncError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        if !self.link.is_link_up() {
            warn!("network link down, skipping sync");
            inner.state.synced = false;
            return Err(SyncError::LinkDown);
        }

        let all_resolved = inner.pool.resolve_all(self.resolver.as_ref()).await;
        let resolved = inner.pool.resolved_count();
        if resolved == 0 {
            error!(total = inner.pool.len(), "no server could be resolved");
            inner.state.synced = false;
            return Err(SyncError::NoServers);
        }
        if !all_resolved {
            info!(resolved, total = inner.pool.len(), "continuing with resolved servers");
        }

        inner.pool.rank_by_performance();

        let max_retries = self.config.max_retries;
        let mut queries = 0u32;
        for idx in 0..inner.pool.len() {
            let Some(server) = inner.pool.server_mut(idx) else {
                break;
            };
            let Some(ip) = server.address() else {
                // ranking puts unresolved servers last
                break;
            };

            for attempt in 1..=max_retries {
                debug!(host = server.hostname(), %ip, attempt, "querying");
                queries += 1;
                let started = Instant::now();
                match self.source.query_time(ip, self.config.query_timeout).await {
                    Ok(sample) => {
                        let response_ms =
                            u32::try_from(started.elapsed().as_millis()).unwrap_or(u32::MAX);
                        let offset = inner.state.utc_offset_seconds;
                        let corrected = sample.utc_epoch + i64::from(offset);
                        // server counters stay untouched when the step fails
                        if let Err(e) = self.clock.set_epoch(corrected) {
                            error!(error = %e, "could not apply time");
                            inner.state.synced = false;
                            return Err(e.into());
                        }
                        server.record_success(response_ms, sample.stratum);
                        inner.state.synced = true;
                        inner.state.last_sync_epoch = corrected;
                        self.persistence.save(corrected, offset);

                        info!(
                            host = server.hostname(),
                            response_ms,
                            stratum = sample.stratum,
                            time = %format_epoch(corrected),
                            "synchronized"
                        );
                        return Ok(SyncReport {
                            server: server.hostname().to_string(),
                            ip,
                            stratum: sample.stratum,
                            response_ms,
                            server_utc: DateTime::from_timestamp(sample.utc_epoch, 0)
                                .unwrap_or_default(),
                            corrected_epoch: corrected,
                            utc_offset_seconds: offset,
                            queries,
                        });
                    }
                    Err(e) => {
                        let failures = server.record_failure();
                        warn!(host = server.hostname(), attempt, failures, error = %e, "query failed");
                        if attempt < max_retries {
                            let delay = backoff_delay(failures);
                            debug!(host = server.hostname(), ?delay, "backing off");
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        error!(queries, "all servers failed");
        inner.state.synced = false;
        Err(SyncError::AllServersExhausted)
    }

    pub async fn is_synced(&self) -> bool {
        self.inner.lock().await.state.synced
    }

    /// Epoch of the last successful sync, 0 if none.
    pub async fn last_sync_time(&self) -> i64 {
        self.inner.lock().await.state.last_sync_epoch
    }

    pub async fn status(&self) -> SyncStatus {
        let inner = self.inner.lock().await;
        SyncStatus {
            state: inner.state.clone(),
            servers: inner.pool.servers().to_vec(),
        }
    }
}

fn format_epoch(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}
