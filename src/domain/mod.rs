pub mod ntp;
pub mod server;
pub mod state;
pub mod timezone;

pub use ntp::{SyncReport, TimeSample};
pub use server::Server;
pub use state::{Intervals, SyncState, SyncStatus};
