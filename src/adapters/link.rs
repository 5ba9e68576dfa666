use std::fs;
use std::path::PathBuf;

use tracing::debug;

use super::LinkMonitor;

/// Link monitor for hosts where connectivity is not observable; always up.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysUp;

impl LinkMonitor for AlwaysUp {
    fn is_link_up(&self) -> bool {
        true
    }
}

/// Reads `/sys/class/net/<name>/operstate`.
#[derive(Clone, Debug)]
pub struct InterfaceLink {
    name: String,
    sysfs_root: PathBuf,
}

impl InterfaceLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_root(name, "/sys/class/net")
    }

    /// Use another sysfs-like root, mainly for tests.
    pub fn with_root(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            sysfs_root: root.into(),
        }
    }
}

impl LinkMonitor for InterfaceLink {
    fn is_link_up(&self) -> bool {
        let path = self.sysfs_root.join(&self.name).join("operstate");
        match fs::read_to_string(&path) {
            // loopback reports "unknown" while fully usable
            Ok(state) => matches!(state.trim(), "up" | "unknown"),
            Err(e) => {
                debug!(interface = %self.name, error = %e, "operstate unreadable");
                false
            }
        }
    }
}
