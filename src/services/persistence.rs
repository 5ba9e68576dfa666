use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::KeyValueStore;

pub const NAMESPACE: &str = "ntp";
pub const KEY_LAST_SYNC: &str = "lastSync";
pub const KEY_UTC_OFFSET: &str = "utcOffset";

/// What survives a restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersistedTime {
    pub last_sync_epoch: i64,
    pub utc_offset_seconds: i32,
}

/// Best-effort load/save of the last sync over a [`KeyValueStore`].
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write both values. Store failures are logged; returns whether the
    /// write went through.
    pub fn save(&self, last_sync_epoch: i64, utc_offset_seconds: i32) -> bool {
        let res = self
            .store
            .put(NAMESPACE, KEY_LAST_SYNC, last_sync_epoch)
            .and_then(|_| {
                self.store
                    .put(NAMESPACE, KEY_UTC_OFFSET, i64::from(utc_offset_seconds))
            });
        match res {
            Ok(()) => {
                debug!(last_sync_epoch, utc_offset_seconds, "sync state saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "could not persist sync state");
                false
            }
        }
    }

    /// Read the persisted values. Anything missing or unreadable falls back
    /// to 0 for the epoch and `default_offset` for the offset.
    pub fn load(&self, default_offset: i32) -> PersistedTime {
        let last_sync_epoch = match self.store.get(NAMESPACE, KEY_LAST_SYNC) {
            Ok(v) => v.unwrap_or(0).max(0),
            Err(e) => {
                warn!(error = %e, "could not read last sync");
                0
            }
        };
        let utc_offset_seconds = match self.store.get(NAMESPACE, KEY_UTC_OFFSET) {
            Ok(v) => v
                .and_then(|o| i32::try_from(o).ok())
                .unwrap_or(default_offset),
            Err(e) => {
                warn!(error = %e, "could not read utc offset");
                default_offset
            }
        };
        PersistedTime {
            last_sync_epoch,
            utc_offset_seconds,
        }
    }
}
