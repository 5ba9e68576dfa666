use std::net::IpAddr;

use serde::Serialize;

/// Placeholder latency for servers that have never answered, so they do not
/// outrank servers with a measured response time.
pub const DEFAULT_RESPONSE_MS: u32 = 1000;

/// One configured time source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Server {
    hostname: String,
    address: Option<IpAddr>,
    pub last_response_ms: u32,
    pub stratum: u8,
    pub failure_count: u32,
}

impl Server {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: None,
            last_response_ms: DEFAULT_RESPONSE_MS,
            stratum: 0,
            failure_count: 0,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    /// A server is resolved exactly when it holds an address.
    pub fn is_resolved(&self) -> bool {
        self.address.is_some()
    }

    pub fn mark_resolved(&mut self, address: IpAddr) {
        self.address = Some(address);
    }

    pub(crate) fn record_success(&mut self, response_ms: u32, stratum: u8) {
        self.failure_count = 0;
        self.last_response_ms = response_ms;
        self.stratum = stratum;
    }

    pub(crate) fn record_failure(&mut self) -> u32 {
        self.failure_count = self.failure_count.saturating_add(1);
        self.failure_count
    }
}
