//! Minimal SNTP packet codec (RFC 4330 client subset).

use crate::error::SyncError;

pub const PACKET_LEN: usize = 48;

/// Seconds between 1900-01-01 and 1970-01-01.
pub const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

const ERA_SECONDS: i64 = 1 << 32;
const MODE_MASK: u8 = 0x07;
const MODE_SERVER: u8 = 4;
/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_HEADER: u8 = 0x1B;
const TRANSMIT_OFFSET: usize = 40;

/// Fields the client trusts out of a server reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    pub mode: u8,
    pub stratum: u8,
    /// Transmit timestamp, whole seconds since 1900 (NTP era 0 or 1).
    pub transmit_secs: u32,
}

impl Response {
    pub fn unix_epoch(&self) -> i64 {
        ntp_to_unix(self.transmit_secs)
    }
}

/// Build a client request packet.
pub fn request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Parse and validate a server reply.
///
/// Rejects short packets, any mode other than server (4), and strata
/// outside 1..=15 (0 is kiss-o'-death / unspecified, 16 unsynchronized).
pub fn parse_response(buf: &[u8]) -> Result<Response, SyncError> {
    if buf.len() < PACKET_LEN {
        return Err(SyncError::InvalidResponse(format!(
            "short packet: {} bytes",
            buf.len()
        )));
    }
    let mode = buf[0] & MODE_MASK;
    if mode != MODE_SERVER {
        return Err(SyncError::InvalidResponse(format!("unexpected mode {mode}")));
    }
    let stratum = buf[1];
    if !(1..=15).contains(&stratum) {
        return Err(SyncError::InvalidResponse(format!(
            "invalid stratum {stratum}"
        )));
    }
    let mut ts = [0u8; 4];
    ts.copy_from_slice(&buf[TRANSMIT_OFFSET..TRANSMIT_OFFSET + 4]);
    Ok(Response {
        mode,
        stratum,
        transmit_secs: u32::from_be_bytes(ts),
    })
}

/// Convert NTP seconds to Unix seconds. Values that would land before 1970
/// are read as era 1 (after the 2036 rollover).
pub fn ntp_to_unix(secs: u32) -> i64 {
    let unix = i64::from(secs) - NTP_UNIX_OFFSET;
    if unix < 0 { unix + ERA_SECONDS } else { unix }
}
