use chrono::DateTime;
use console::style;

use crate::domain::{timezone, SyncReport, SyncStatus};
use crate::services::PersistedTime;

fn format_epoch(epoch: i64) -> String {
    if epoch <= 0 {
        return "never".into();
    }
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    format!("UTC{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// Render a successful sync.
pub fn render_report(r: &SyncReport) -> String {
    let ip_version = if r.ip.is_ipv6() { "v6" } else { "v4" };
    format!(
        "{srv_lbl} {srv_val}\n\
         {ip_lbl} {ip_val} ({ver})\n\
         {utc_lbl} {utc_val}\n\
         {loc_lbl} {loc_val} ({off})\n\
         {rsp_lbl} {rsp_val} ms\n\
         {str_lbl} {str_val}\n\
         {qry_lbl} {qry_val}",
        srv_lbl = style("Server:").cyan().bold(),
        srv_val = style(&r.server).green(),
        ip_lbl = style("IP:").cyan().bold(),
        ip_val = style(r.ip).green(),
        ver = ip_version,
        utc_lbl = style("Server UTC:").cyan().bold(),
        utc_val = style(r.server_utc.to_rfc2822()).green(),
        loc_lbl = style("Clock Set To:").cyan().bold(),
        loc_val = style(format_epoch(r.corrected_epoch)).green(),
        off = format_offset(r.utc_offset_seconds),
        rsp_lbl = style("Response Time:").cyan().bold(),
        rsp_val = r.response_ms,
        str_lbl = style("Stratum:").cyan().bold(),
        str_val = r.stratum,
        qry_lbl = style("Queries:").cyan().bold(),
        qry_val = r.queries,
    )
}

/// Render client state and the ranked server pool.
pub fn render_status(s: &SyncStatus) -> String {
    let synced = if s.state.synced {
        style("yes").green()
    } else {
        style("no").red()
    };
    let mut out = format!(
        "{} {} ({})\n{} {}\n{} {}\n{} {}\n",
        style("Timezone:").cyan().bold(),
        s.state.timezone_id,
        format_offset(s.state.utc_offset_seconds),
        style("DST:").cyan().bold(),
        if s.state.dst_active { "active" } else { "inactive" },
        style("Synced:").cyan().bold(),
        synced,
        style("Last Sync:").cyan().bold(),
        format_epoch(s.state.last_sync_epoch),
    );
    for server in &s.servers {
        let addr = server
            .address()
            .map(|ip| style(ip.to_string()).blue())
            .unwrap_or_else(|| style("unresolved".to_string()).red());
        out.push_str(&format!(
            "  {} [{}]: {} ms, stratum {}, failures {}\n",
            style(server.hostname()).green().bold(),
            addr,
            server.last_response_ms,
            server.stratum,
            server.failure_count,
        ));
    }
    out
}

pub fn render_persisted(p: &PersistedTime) -> String {
    format!(
        "{} {}\n{} {}",
        style("Last Sync:").cyan().bold(),
        style(format_epoch(p.last_sync_epoch)).green(),
        style("UTC Offset:").cyan().bold(),
        format_offset(p.utc_offset_seconds),
    )
}

/// One line per known timezone.
pub fn render_zones() -> String {
    timezone::TIMEZONE_OFFSETS
        .iter()
        .map(|(id, hours)| format!("{:<22} {}", id, format_offset(hours * 3600)))
        .collect::<Vec<_>>()
        .join("\n")
}
