use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::time::Duration;

use super::server::Server;
use super::timezone;

const SECONDS_PER_MINUTE: u64 = 60;

/// Per-client synchronization state. Only the engine mutates it, under its
/// guard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub timezone_id: String,
    pub utc_offset_seconds: i32,
    /// Informational; never folded into `utc_offset_seconds`.
    pub dst_active: bool,
    /// 0 when never synced.
    pub last_sync_epoch: i64,
    pub synced: bool,
}

impl SyncState {
    pub fn new(timezone_id: impl Into<String>) -> Self {
        let timezone_id = timezone_id.into();
        let utc_offset_seconds = timezone::offset_seconds(&timezone_id);
        Self {
            timezone_id,
            utc_offset_seconds,
            dst_active: false,
            last_sync_epoch: 0,
            synced: false,
        }
    }

    pub fn update_dst(&mut self, now: DateTime<Utc>) {
        self.dst_active = dst_season(now);
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new("UTC")
    }
}

/// Point-in-time view of a client, for display.
#[derive(Clone, Debug, Serialize)]
pub struct SyncStatus {
    #[serde(flatten)]
    pub state: SyncState,
    pub servers: Vec<Server>,
}

/// Simplified southern summer rule: November through February.
pub fn dst_season(now: DateTime<Utc>) -> bool {
    matches!(now.month(), 11 | 12 | 1 | 2)
}

/// Success and failure cadence of the periodic scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intervals {
    pub sync: Duration,
    pub retry: Duration,
}

impl Intervals {
    /// Minutes beyond what fits in a `Duration` of seconds saturate.
    pub fn from_minutes(sync_minutes: u64, retry_minutes: u64) -> Self {
        Self {
            sync: Duration::from_secs(sync_minutes.saturating_mul(SECONDS_PER_MINUTE)),
            retry: Duration::from_secs(retry_minutes.saturating_mul(SECONDS_PER_MINUTE)),
        }
    }

    pub fn next_delay(&self, synced: bool) -> Duration {
        if synced { self.sync } else { self.retry }
    }
}

impl Default for Intervals {
    fn default() -> Self {
        Self::from_minutes(60, 5)
    }
}
