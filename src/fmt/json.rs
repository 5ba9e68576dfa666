#[cfg(feature = "json")]
use chrono::Utc;
#[cfg(feature = "json")]
use serde::Serialize;

use crate::domain::{SyncReport, SyncStatus};
use crate::error::SyncError;
use crate::services::PersistedTime;

#[cfg(feature = "json")]
#[derive(Serialize)]
struct JsonEnvelope<'a, T: Serialize> {
    schema_version: u8,
    run_ts: String,
    #[serde(flatten)]
    body: &'a T,
}

#[cfg(feature = "json")]
#[derive(Serialize)]
struct JsonPersisted {
    last_sync_epoch: i64,
    utc_offset_seconds: i32,
}

#[cfg(feature = "json")]
fn render<T: Serialize>(body: &T, pretty: bool) -> Result<String, SyncError> {
    let run = JsonEnvelope {
        schema_version: 1,
        run_ts: Utc::now().to_rfc3339(),
        body,
    };
    let text = if pretty {
        serde_json::to_string_pretty(&run)
    } else {
        serde_json::to_string(&run)
    };
    text.map_err(|e| SyncError::Config(e.to_string()))
}

/// Serialize a sync report into JSON.
#[allow(unused_variables)]
pub fn report_to_json(report: &SyncReport, pretty: bool) -> Result<String, SyncError> {
    #[cfg(feature = "json")]
    {
        render(report, pretty)
    }
    #[cfg(not(feature = "json"))]
    {
        Err(SyncError::Config("json feature disabled".into()))
    }
}

#[allow(unused_variables)]
pub fn status_to_json(status: &SyncStatus, pretty: bool) -> Result<String, SyncError> {
    #[cfg(feature = "json")]
    {
        render(status, pretty)
    }
    #[cfg(not(feature = "json"))]
    {
        Err(SyncError::Config("json feature disabled".into()))
    }
}

#[allow(unused_variables)]
pub fn persisted_to_json(persisted: &PersistedTime, pretty: bool) -> Result<String, SyncError> {
    #[cfg(feature = "json")]
    {
        let body = JsonPersisted {
            last_sync_epoch: persisted.last_sync_epoch,
            utc_offset_seconds: persisted.utc_offset_seconds,
        };
        render(&body, pretty)
    }
    #[cfg(not(feature = "json"))]
    {
        Err(SyncError::Config("json feature disabled".into()))
    }
}
