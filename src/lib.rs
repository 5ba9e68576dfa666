//! ntpsync: best-effort NTP time synchronization.
//!
//! A [`SyncClient`] keeps a ranked pool of time servers, queries them with
//! per-server retry and exponential backoff, applies the configured UTC
//! offset to a clock and persists the last successful sync so the clock can
//! be seeded approximately after a restart.

pub mod adapters;
pub mod client;
pub mod config;
pub mod domain;
mod error;
pub mod fmt;
pub mod logging;
pub mod ntp;
pub mod services;
pub mod sync;

pub use client::{SyncClient, SyncClientBuilder};
pub use config::Config;
pub use domain::{Intervals, Server, SyncReport, SyncState, SyncStatus, TimeSample};
pub use error::{ClockError, SyncError};
pub use services::{backoff_delay, EngineConfig, ServerPool, SyncEngine, TaskOptions};
