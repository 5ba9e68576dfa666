use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::engine::SyncEngine;
use crate::domain::Intervals;
use crate::error::SyncError;

/// Where a dedicated scheduler thread runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskOptions {
    pub name: String,
    pub stack_size: usize,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            name: "ntp-sync".into(),
            stack_size: 512 * 1024,
        }
    }
}

/// Attempt, then sleep the sync interval on success or the retry interval
/// on failure. Intervals are read again before every sleep. Never returns.
pub async fn run_periodic(engine: Arc<SyncEngine>, intervals: watch::Receiver<Intervals>) {
    loop {
        let synced = match engine.attempt_sync().await {
            Ok(report) => {
                debug!(server = %report.server, queries = report.queries, "sync cycle ok");
                true
            }
            Err(e) => {
                warn!(error = %e, "sync cycle failed");
                false
            }
        };
        let delay = intervals.borrow().next_delay(synced);
        debug!(?delay, synced, "next sync cycle");
        tokio::time::sleep(delay).await;
    }
}

/// Guarantees at most one periodic loop per owner.
#[derive(Debug, Default)]
pub struct Scheduler {
    running: AtomicBool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Reserve the single loop slot. The slot is released again if the
    /// returned claim is dropped without spawning.
    pub fn try_claim(&self) -> Result<SchedulerClaim<'_>, SyncError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SyncError::AlreadyRunning);
        }
        Ok(SchedulerClaim {
            running: &self.running,
            spawned: false,
        })
    }
}

/// Held between claiming the slot and spawning the loop.
#[derive(Debug)]
pub struct SchedulerClaim<'a> {
    running: &'a AtomicBool,
    spawned: bool,
}

impl SchedulerClaim<'_> {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(
        mut self,
        engine: Arc<SyncEngine>,
        intervals: watch::Receiver<Intervals>,
    ) -> Result<JoinHandle<()>, SyncError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SyncError::Config(format!("no tokio runtime: {e}")))?;
        self.spawned = true;
        info!("periodic sync started");
        Ok(handle.spawn(run_periodic(engine, intervals)))
    }

    /// Run the loop on its own named thread with a current-thread runtime.
    /// The persisted state is restored on that thread before the first cycle.
    pub fn spawn_dedicated(
        mut self,
        engine: Arc<SyncEngine>,
        intervals: watch::Receiver<Intervals>,
        options: &TaskOptions,
    ) -> Result<thread::JoinHandle<()>, SyncError> {
        let handle = thread::Builder::new()
            .name(options.name.clone())
            .stack_size(options.stack_size)
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(error = %e, "could not build sync runtime");
                        return;
                    }
                };
                rt.block_on(async move {
                    engine.restore().await;
                    run_periodic(engine, intervals).await;
                });
            })?;
        self.spawned = true;
        info!(thread = %options.name, "periodic sync started");
        Ok(handle)
    }
}

impl Drop for SchedulerClaim<'_> {
    fn drop(&mut self) {
        if !self.spawned {
            self.running.store(false, Ordering::SeqCst);
        }
    }
}
