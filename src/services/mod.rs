pub mod engine;
pub mod persistence;
pub mod pool;
pub mod scheduler;

pub use engine::{backoff_delay, Collaborators, EngineConfig, SyncEngine};
pub use persistence::{PersistedTime, Persistence};
pub use pool::ServerPool;
pub use scheduler::{run_periodic, Scheduler, SchedulerClaim, TaskOptions};
