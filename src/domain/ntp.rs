use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;

/// What a time source reports for one query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSample {
    /// Server UTC, seconds since the Unix epoch.
    pub utc_epoch: i64,
    pub stratum: u8,
    pub round_trip: Duration,
}

/// Outcome of a successful synchronization attempt.
#[derive(Clone, Debug, Serialize)]
pub struct SyncReport {
    pub server: String,
    pub ip: IpAddr,
    pub stratum: u8,
    pub response_ms: u32,
    /// Server UTC before offset correction.
    pub server_utc: DateTime<Utc>,
    /// Value applied to the clock (UTC + configured offset).
    pub corrected_epoch: i64,
    pub utc_offset_seconds: i32,
    /// Queries issued in this attempt, failed ones included.
    pub queries: u32,
}
