use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::trace;

use super::TimeSource;
use crate::domain::TimeSample;
use crate::error::SyncError;
use crate::ntp::packet;

/// Time source speaking SNTP directly over a UDP socket.
#[derive(Clone, Copy, Debug)]
pub struct SntpSocketSource {
    pub port: u16,
}

impl Default for SntpSocketSource {
    fn default() -> Self {
        Self { port: 123 }
    }
}

impl SntpSocketSource {
    async fn exchange(&self, ip: IpAddr) -> Result<TimeSample, SyncError> {
        let bind: SocketAddr = if ip.is_ipv6() {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        } else {
            ([0, 0, 0, 0], 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(SocketAddr::new(ip, self.port)).await?;

        let start = Instant::now();
        socket.send(&packet::request()).await?;

        let mut buf = [0u8; 1024];
        let n = socket.recv(&mut buf).await?;
        let round_trip = start.elapsed();
        trace!(%ip, bytes = n, "sntp reply");

        let resp = packet::parse_response(&buf[..n])?;
        Ok(TimeSample {
            utc_epoch: resp.unix_epoch(),
            stratum: resp.stratum,
            round_trip,
        })
    }
}

#[async_trait]
impl TimeSource for SntpSocketSource {
    async fn query_time(&self, ip: IpAddr, timeout: Duration) -> Result<TimeSample, SyncError> {
        tokio::time::timeout(timeout, self.exchange(ip))
            .await
            .map_err(|_| SyncError::QueryTimeout(ip.to_string()))?
    }
}
