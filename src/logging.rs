//! Process-wide `tracing` subscriber with a runtime on/off switch.
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

pub const ENV_VAR: &str = "NTPSYNC_LOG";

static ENABLED: AtomicBool = AtomicBool::new(true);
static GATE: OnceLock<reload::Handle<LevelFilter, Registry>> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct LogOptions {
    /// ANSI colours in the output.
    pub color: bool,
    /// Filter used when `NTPSYNC_LOG` is unset.
    pub default_directive: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            color: true,
            default_directive: "info".into(),
        }
    }
}

fn gate_level(enabled: bool) -> LevelFilter {
    if enabled {
        LevelFilter::TRACE
    } else {
        LevelFilter::OFF
    }
}

fn apply_gate<S>(handle: &reload::Handle<LevelFilter, S>, enabled: bool) {
    let _ = handle.reload(gate_level(enabled));
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(options: &LogOptions) -> bool {
    let (gate, handle) = reload::Layer::new(gate_level(is_enabled()));
    let filter = EnvFilter::try_from_env(ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&options.default_directive));
    let installed = tracing_subscriber::registry()
        .with(gate)
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(options.color)
                .with_target(false),
        )
        .try_init()
        .is_ok();
    if installed {
        let _ = GATE.set(handle);
    }
    installed
}

/// Turn log output on or off. Takes effect immediately when the subscriber
/// is installed, otherwise at [`init`].
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::SeqCst);
    if let Some(handle) = GATE.get() {
        apply_gate(handle, enabled);
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}
