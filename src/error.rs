use std::io;

use thiserror::Error;

/// Top-level error type for the ntpsync library.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network link reported down; nothing was sent.
    #[error("link: network link is down")]
    LinkDown,
    /// A hostname could not be resolved this cycle.
    #[error("dns: {host}: {reason}")]
    Resolution { host: String, reason: String },
    /// No configured server is usable for this attempt.
    #[error("dns: no server could be resolved")]
    NoServers,
    /// A server did not answer within the query timeout.
    #[error("network: timeout querying {0}")]
    QueryTimeout(String),
    /// A server answered with something that cannot be trusted.
    #[error("protocol: {0}")]
    InvalidResponse(String),
    /// Every resolved server exhausted its retries.
    #[error("all servers failed")]
    AllServersExhausted,
    /// The durable store could not be opened or written.
    #[error("store: {0}")]
    PersistenceUnavailable(String),
    /// The clock could not be stepped.
    #[error("clock: {0}")]
    Clock(#[from] ClockError),
    /// A periodic scheduler is already running for this client.
    #[error("scheduler already running")]
    AlreadyRunning,
    /// Invalid configuration value or file.
    #[error("config: {0}")]
    Config(String),
    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<rsntp::SynchronizationError> for SyncError {
    fn from(err: rsntp::SynchronizationError) -> Self {
        match err {
            rsntp::SynchronizationError::IOError(e) => SyncError::Io(e),
            rsntp::SynchronizationError::ProtocolError(e) => {
                SyncError::InvalidResponse(e.to_string())
            }
        }
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

/// Failure to step the clock.
#[derive(Error, Debug)]
pub enum ClockError {
    #[error("clock stepping not supported on this platform")]
    NotSupported,
    #[error("need root or CAP_SYS_TIME: {0}")]
    Permission(io::Error),
    #[error("{0}")]
    Sys(io::Error),
    #[error("epoch {0} out of range")]
    OutOfRange(i64),
}
