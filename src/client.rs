use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::adapters::{
    AlwaysUp, DnsResolver, KeyValueStore, LinkMonitor, MemoryStore, Resolver, RsntpSource,
    TimeSource,
};
use crate::domain::{Intervals, SyncReport, SyncStatus};
use crate::error::SyncError;
use crate::logging;
use crate::services::{
    Collaborators, EngineConfig, PersistedTime, Scheduler, SyncEngine, TaskOptions,
};
use crate::sync::{ProcessClock, SystemClock};

/// A time-synchronization client: one engine, one periodic scheduler.
///
/// ```no_run
/// # async fn demo() -> Result<(), ntpsync::SyncError> {
/// let client = ntpsync::SyncClient::builder().build();
/// client
///     .configure("America/Sao_Paulo", ["pool.ntp.org", "br.pool.ntp.org"])
///     .await;
/// client.set_intervals(60, 5);
/// let _task = client.start().await?;
/// # Ok(())
/// # }
/// ```
pub struct SyncClient {
    engine: Arc<SyncEngine>,
    intervals: watch::Sender<Intervals>,
    scheduler: Scheduler,
}

impl SyncClient {
    pub fn builder() -> SyncClientBuilder {
        SyncClientBuilder::default()
    }

    /// Replace timezone and servers.
    pub async fn configure<I, S>(&self, timezone_id: &str, servers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engine.configure(timezone_id, servers).await;
    }

    /// Picked up by the scheduler before its next sleep.
    pub fn set_intervals(&self, sync_minutes: u64, retry_minutes: u64) {
        self.set_interval_durations(Intervals::from_minutes(sync_minutes, retry_minutes));
    }

    pub fn set_interval_durations(&self, intervals: Intervals) {
        self.intervals.send_replace(intervals);
    }

    pub fn intervals(&self) -> Intervals {
        *self.intervals.borrow()
    }

    /// Seed the clock from the persisted last sync.
    pub async fn restore(&self) -> PersistedTime {
        self.engine.restore().await
    }

    /// Restore persisted state, then run the periodic loop on the current
    /// tokio runtime. Fails with [`SyncError::AlreadyRunning`] on a second
    /// call.
    pub async fn start(&self) -> Result<JoinHandle<()>, SyncError> {
        let claim = self.scheduler.try_claim()?;
        self.engine.restore().await;
        claim.spawn(Arc::clone(&self.engine), self.intervals.subscribe())
    }

    /// Like [`start`](Self::start) but on a dedicated thread; usable
    /// outside a tokio runtime.
    pub fn start_dedicated(&self, options: &TaskOptions) -> Result<thread::JoinHandle<()>, SyncError> {
        self.scheduler.try_claim()?.spawn_dedicated(
            Arc::clone(&self.engine),
            self.intervals.subscribe(),
            options,
        )
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Run one attempt now, outside the schedule.
    pub async fn sync_now(&self) -> Result<SyncReport, SyncError> {
        self.engine.attempt_sync().await
    }

    /// Waits for any in-flight attempt.
    pub async fn is_synced(&self) -> bool {
        self.engine.is_synced().await
    }

    /// Waits for any in-flight attempt. 0 if never synced.
    pub async fn last_sync_time(&self) -> i64 {
        self.engine.last_sync_time().await
    }

    pub async fn status(&self) -> SyncStatus {
        self.engine.status().await
    }

    pub fn set_logging(&self, enabled: bool) {
        logging::set_enabled(enabled);
    }
}

/// Builder for [`SyncClient`]. Unset collaborators default to: link always
/// up, system DNS, `rsntp` queries, in-memory store, process-local clock.
#[derive(Default)]
pub struct SyncClientBuilder {
    link: Option<Arc<dyn LinkMonitor>>,
    resolver: Option<Arc<dyn Resolver>>,
    source: Option<Arc<dyn TimeSource>>,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn SystemClock>>,
    config: EngineConfig,
    intervals: Intervals,
}

impl SyncClientBuilder {
    pub fn link(mut self, link: Arc<dyn LinkMonitor>) -> Self {
        self.link = Some(link);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn source(mut self, source: Arc<dyn TimeSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn SystemClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn intervals(mut self, intervals: Intervals) -> Self {
        self.intervals = intervals;
        self
    }

    pub fn build(self) -> SyncClient {
        let collaborators = Collaborators {
            link: self.link.unwrap_or_else(|| Arc::new(AlwaysUp)),
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(DnsResolver::default())),
            source: self
                .source
                .unwrap_or_else(|| Arc::new(RsntpSource::default())),
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(ProcessClock::new())),
        };
        let (intervals, _) = watch::channel(self.intervals);
        SyncClient {
            engine: Arc::new(SyncEngine::new(collaborators, self.config)),
            intervals,
            scheduler: Scheduler::new(),
        }
    }
}
