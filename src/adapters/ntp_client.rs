use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rsntp::{AsyncSntpClient, Config};

use super::TimeSource;
use crate::domain::TimeSample;
use crate::error::SyncError;

/// Time source backed by the `rsntp` SNTP client.
#[derive(Clone, Copy, Debug)]
pub struct RsntpSource {
    pub port: u16,
}

impl Default for RsntpSource {
    fn default() -> Self {
        Self { port: 123 }
    }
}

#[async_trait]
impl TimeSource for RsntpSource {
    async fn query_time(&self, ip: IpAddr, timeout: Duration) -> Result<TimeSample, SyncError> {
        let cfg = if ip.is_ipv6() {
            Config::default().bind_address((Ipv6Addr::UNSPECIFIED, 0).into())
        } else {
            Config::default().bind_address(([0, 0, 0, 0], 0).into())
        };
        let client = AsyncSntpClient::with_config(cfg);
        // rsntp has its own timeout; bound it with ours so the engine's value wins
        let addr = SocketAddr::new(ip, self.port).to_string();
        let res = tokio::time::timeout(timeout, client.synchronize(addr))
            .await
            .map_err(|_| SyncError::QueryTimeout(ip.to_string()))??;

        let utc: DateTime<Utc> = match res.datetime().try_into() {
            Ok(dt) => dt,
            Err(e) => return Err(SyncError::InvalidResponse(e.to_string())),
        };
        let rtt_secs = res.round_trip_delay().as_secs_f64().max(0.0);

        Ok(TimeSample {
            utc_epoch: utc.timestamp(),
            stratum: res.stratum(),
            round_trip: Duration::from_secs_f64(rtt_secs),
        })
    }
}
