use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tracing::debug;

use super::Resolver;
use crate::error::SyncError;

const NTP_PORT: u16 = 123;

/// System resolver. Prefers IPv4 unless `ipv6_only` is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct DnsResolver {
    pub ipv6_only: bool,
}

impl DnsResolver {
    pub fn new(ipv6_only: bool) -> Self {
        Self { ipv6_only }
    }
}

#[async_trait]
impl Resolver for DnsResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, SyncError> {
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(ip);
        }
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((hostname, NTP_PORT))
            .await
            .map_err(|e| SyncError::Resolution {
                host: hostname.to_string(),
                reason: e.to_string(),
            })?
            .collect();
        debug!(host = hostname, candidates = addrs.len(), "dns lookup done");
        pick_address(hostname, &addrs, self.ipv6_only)
    }
}

/// Pick the preferred address: IPv6 only, or IPv4 first then IPv6.
pub fn pick_address(
    hostname: &str,
    addrs: &[SocketAddr],
    ipv6_only: bool,
) -> Result<IpAddr, SyncError> {
    let chosen = if ipv6_only {
        addrs.iter().map(|a| a.ip()).find(IpAddr::is_ipv6)
    } else {
        addrs
            .iter()
            .map(|a| a.ip())
            .find(IpAddr::is_ipv4)
            .or_else(|| addrs.first().map(|a| a.ip()))
    };

    chosen.ok_or_else(|| SyncError::Resolution {
        host: hostname.to_string(),
        reason: if ipv6_only {
            "no IPv6 address found".into()
        } else {
            "no IP address found".into()
        },
    })
}
