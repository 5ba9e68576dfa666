//! Collaborator interfaces the engine consumes, with the stock
//! implementations used by the binary.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::TimeSample;
use crate::error::SyncError;

pub mod link;
pub mod ntp_client;
pub mod resolver;
pub mod sntp_client;
pub mod store;

pub use link::{AlwaysUp, InterfaceLink};
pub use ntp_client::RsntpSource;
pub use resolver::DnsResolver;
pub use sntp_client::SntpSocketSource;
pub use store::{FileStore, MemoryStore};

/// Reports whether the network link is usable.
pub trait LinkMonitor: Send + Sync {
    fn is_link_up(&self) -> bool;
}

/// Hostname resolution.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, SyncError>;
}

/// Queries a single server for the current UTC time.
#[async_trait]
pub trait TimeSource: Send + Sync {
    async fn query_time(&self, addr: IpAddr, timeout: Duration) -> Result<TimeSample, SyncError>;
}

/// Durable integer key-value storage, grouped by namespace.
///
/// Each call opens and closes the underlying store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<i64>, SyncError>;
    fn put(&self, namespace: &str, key: &str, value: i64) -> Result<(), SyncError>;
}
