use clap::Parser;
use console::{Term, set_colors_enabled, style};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;

use ntpsync::adapters::{
    AlwaysUp, DnsResolver, FileStore, InterfaceLink, LinkMonitor, RsntpSource, SntpSocketSource,
    TimeSource,
};
use ntpsync::logging::{self, LogOptions};
use ntpsync::services::Persistence;
#[cfg(feature = "sync")]
use ntpsync::sync::{HostClock, has_clock_permission};
use ntpsync::sync::{ProcessClock, SystemClock};
use ntpsync::{Config, SyncClient, SyncError, fmt};

#[derive(Parser, Debug)]
#[command(name = "ntpsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keep the clock approximately right from a pool of NTP servers")]
struct Args {
    /// Config file (default: $NTPSYNC_CONFIG_DIR/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Timezone identifier, see --zones
    #[arg(short = 'z', long)]
    timezone: Option<String>,

    /// NTP server, repeatable; replaces the configured list
    #[arg(short, long = "server")]
    servers: Vec<String>,

    /// Run a single attempt and exit
    #[arg(long)]
    once: bool,

    /// Show the persisted last sync and exit
    #[arg(long)]
    status: bool,

    /// List known timezones and exit
    #[arg(long)]
    zones: bool,

    /// Minutes between syncs after a success
    #[arg(long)]
    sync_interval: Option<u64>,

    /// Minutes between attempts after a failure
    #[arg(long)]
    retry_interval: Option<u64>,

    /// Queries per server before moving to the next
    #[arg(long)]
    max_retries: Option<u32>,

    /// Per-query timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Use IPv6 resolution only
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Query with the built-in SNTP codec instead of rsntp
    #[arg(long)]
    raw: bool,

    /// Only sync while this interface is up
    #[arg(long)]
    interface: Option<String>,

    /// State file for the last sync
    #[arg(long)]
    store: Option<PathBuf>,

    /// Step the system clock (requires root)
    #[cfg(feature = "sync")]
    #[arg(long)]
    set_system_clock: bool,

    /// Go through the motions without stepping the system clock
    #[cfg(feature = "sync")]
    #[arg(short = '0', long = "dry-run")]
    dry_run: bool,

    /// JSON output
    #[cfg(feature = "json")]
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty-print JSON
    #[cfg(feature = "json")]
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Disable colored output
    #[arg(long = "no-color", alias = "nocolor")]
    no_color: bool,

    /// Silence logs
    #[arg(short, long)]
    quiet: bool,

    /// Debug logs
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn json(&self) -> bool {
        #[cfg(feature = "json")]
        {
            self.json
        }
        #[cfg(not(feature = "json"))]
        {
            false
        }
    }

    fn pretty(&self) -> bool {
        #[cfg(feature = "json")]
        {
            self.pretty
        }
        #[cfg(not(feature = "json"))]
        {
            false
        }
    }

    fn apply(&self, cfg: &mut Config) {
        if let Some(tz) = &self.timezone {
            cfg.sync.timezone = tz.clone();
        }
        if !self.servers.is_empty() {
            cfg.sync.servers = self.servers.clone();
        }
        if let Some(v) = self.sync_interval {
            cfg.sync.sync_interval_minutes = v;
        }
        if let Some(v) = self.retry_interval {
            cfg.sync.retry_interval_minutes = v;
        }
        if let Some(v) = self.max_retries {
            cfg.sync.max_retries = v;
        }
        if let Some(v) = self.timeout {
            cfg.sync.query_timeout_secs = v;
        }
        if self.ipv6 {
            cfg.sync.ipv6_only = true;
        }
        if let Some(p) = &self.store {
            cfg.store.path = Some(p.clone());
        }
        if self.quiet {
            cfg.logging.enabled = false;
        }
        if self.no_color {
            cfg.logging.color = false;
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let want_color = !args.json()
        && io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none()
        && !args.no_color;
    set_colors_enabled(want_color);

    let term = Term::stdout();
    let code = match run(&args, &term, want_color).await {
        Ok(code) => code,
        Err(e) => handle_error(&term, e),
    };
    process::exit(code);
}

async fn run(args: &Args, term: &Term, want_color: bool) -> Result<i32, SyncError> {
    if args.zones {
        term.write_line(&fmt::text::render_zones()).ok();
        return Ok(0);
    }

    let mut cfg = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply(&mut cfg);
    cfg.validate()?;

    logging::set_enabled(cfg.logging.enabled);
    logging::init(&LogOptions {
        color: cfg.logging.color && want_color && io::stderr().is_terminal(),
        default_directive: if args.verbose {
            "ntpsync=debug".into()
        } else {
            "ntpsync=info".into()
        },
    });

    let store = Arc::new(FileStore::new(cfg.state_path()));

    if args.status {
        let persisted = Persistence::new(store).load(ntpsync::domain::timezone::offset_seconds(
            &cfg.sync.timezone,
        ));
        if args.json() {
            println!("{}", fmt::json::persisted_to_json(&persisted, args.pretty())?);
        } else {
            term.write_line(&fmt::text::render_persisted(&persisted)).ok();
        }
        return Ok(0);
    }

    let link: Arc<dyn LinkMonitor> = match &args.interface {
        Some(name) => Arc::new(InterfaceLink::new(name.clone())),
        None => Arc::new(AlwaysUp),
    };
    let source: Arc<dyn TimeSource> = if args.raw {
        Arc::new(SntpSocketSource::default())
    } else {
        Arc::new(RsntpSource::default())
    };

    let client = SyncClient::builder()
        .link(link)
        .resolver(Arc::new(DnsResolver::new(cfg.sync.ipv6_only)))
        .source(source)
        .store(store)
        .clock(select_clock(args, term))
        .engine_config(cfg.engine_config())
        .intervals(cfg.intervals())
        .build();
    client.configure(&cfg.sync.timezone, cfg.servers()).await;

    if args.once {
        client.restore().await;
        let report = client.sync_now().await?;
        if args.json() {
            println!("{}", fmt::json::report_to_json(&report, args.pretty())?);
        } else {
            term.write_line(&fmt::text::render_report(&report)).ok();
        }
        return Ok(0);
    }

    let task = client.start().await?;
    term.write_line(
        &style(format!(
            "Syncing {} server(s) every {} min (retry {} min), Ctrl-C to stop",
            cfg.servers().len(),
            cfg.sync.sync_interval_minutes,
            cfg.sync.retry_interval_minutes
        ))
        .green()
        .to_string(),
    )
    .ok();

    tokio::select! {
        _ = signal::ctrl_c() => {}
        res = task => {
            if let Err(e) = res {
                term.write_line(&style(format!("Error: sync task ended: {}", e)).red().to_string()).ok();
                return Ok(1);
            }
        }
    }

    let status = client.status().await;
    if args.json() {
        println!("{}", fmt::json::status_to_json(&status, args.pretty())?);
    } else {
        term.write_line(&fmt::text::render_status(&status)).ok();
    }
    Ok(0)
}

#[cfg(feature = "sync")]
fn select_clock(args: &Args, term: &Term) -> Arc<dyn SystemClock> {
    if !args.set_system_clock {
        return Arc::new(ProcessClock::new());
    }
    if args.dry_run {
        term.write_line(&style("Clock steps skipped (dry-run)").yellow().to_string())
            .ok();
        return Arc::new(HostClock::new(true));
    }
    if !has_clock_permission() {
        term.write_line(
            &style("Warning: need root or CAP_SYS_TIME, clock steps will fail")
                .yellow()
                .to_string(),
        )
        .ok();
    }
    Arc::new(HostClock::new(false))
}

#[cfg(not(feature = "sync"))]
fn select_clock(_: &Args, _: &Term) -> Arc<dyn SystemClock> {
    Arc::new(ProcessClock::new())
}

fn handle_error(term: &Term, err: SyncError) -> i32 {
    term.write_line(&style(format!("Error: {}", err)).red().to_string())
        .ok();
    match err {
        SyncError::Resolution { .. } | SyncError::NoServers => 2,
        SyncError::QueryTimeout(_) | SyncError::AllServersExhausted => 3,
        SyncError::LinkDown => 4,
        SyncError::Clock(_) => 12,
        _ => 1,
    }
}
