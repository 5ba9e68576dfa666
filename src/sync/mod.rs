//! Applying a corrected epoch to a clock.
//!
//! `HostClock` steps the system clock (Unix, feature = "sync", needs root).
//! `ProcessClock` keeps the correction inside the process and leaves the
//! host untouched.
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::ClockError;

/// Clock the engine steps on sync and on restore.
pub trait SystemClock: Send + Sync {
    /// Current clock value, seconds since the Unix epoch.
    fn now_epoch(&self) -> i64;
    /// Step the clock to `epoch` (whole seconds).
    fn set_epoch(&self, epoch: i64) -> Result<(), ClockError>;
}

/// Process-local clock: the host clock plus a stored correction.
#[derive(Debug, Default)]
pub struct ProcessClock {
    correction_secs: AtomicI64,
}

impl ProcessClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn correction_secs(&self) -> i64 {
        self.correction_secs.load(Ordering::Relaxed)
    }
}

impl SystemClock for ProcessClock {
    fn now_epoch(&self) -> i64 {
        Utc::now().timestamp() + self.correction_secs()
    }

    fn set_epoch(&self, epoch: i64) -> Result<(), ClockError> {
        self.correction_secs
            .store(epoch - Utc::now().timestamp(), Ordering::Relaxed);
        Ok(())
    }
}

/// The host's realtime clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostClock {
    pub dry_run: bool,
}

impl HostClock {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl SystemClock for HostClock {
    fn now_epoch(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn set_epoch(&self, epoch: i64) -> Result<(), ClockError> {
        let target = DateTime::from_timestamp(epoch, 0).ok_or(ClockError::OutOfRange(epoch))?;
        step_to_utc(&target, self.dry_run)
    }
}

/// Whether the process may step the system clock.
pub fn has_clock_permission() -> bool {
    #[cfg(all(unix, feature = "sync"))]
    unsafe {
        if libc::geteuid() != 0 {
            return false;
        }
    }
    true
}

#[cfg(all(unix, feature = "sync"))]
fn step_to_utc(utc: &DateTime<Utc>, dry_run: bool) -> Result<(), ClockError> {
    use libc::{CLOCK_REALTIME, clock_settime, timespec};

    if dry_run {
        return Ok(());
    }
    let ts = timespec {
        tv_sec: utc.timestamp() as libc::time_t,
        tv_nsec: utc.timestamp_subsec_nanos() as libc::c_long,
    };
    let rc = unsafe { clock_settime(CLOCK_REALTIME, &ts as *const timespec) };
    if rc != 0 {
        let e = std::io::Error::last_os_error();
        return Err(match e.raw_os_error() {
            Some(code) if code == libc::EPERM || code == libc::EACCES => ClockError::Permission(e),
            _ => ClockError::Sys(e),
        });
    }
    Ok(())
}

#[cfg(not(all(unix, feature = "sync")))]
fn step_to_utc(_: &DateTime<Utc>, dry_run: bool) -> Result<(), ClockError> {
    if dry_run {
        return Ok(());
    }
    Err(ClockError::NotSupported)
}
