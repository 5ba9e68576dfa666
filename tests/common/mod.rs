#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use ntpsync::adapters::{KeyValueStore, LinkMonitor, MemoryStore, Resolver, TimeSource};
use ntpsync::services::Collaborators;
use ntpsync::sync::SystemClock;
use ntpsync::{ClockError, EngineConfig, SyncEngine, SyncError, TimeSample};

pub const REPORTED_EPOCH: i64 = 1_700_000_000;

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[derive(Default)]
pub struct FlagLink {
    down: AtomicBool,
}

impl FlagLink {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl LinkMonitor for FlagLink {
    fn is_link_up(&self) -> bool {
        !self.down.load(Ordering::SeqCst)
    }
}

/// Resolves only the hostnames it was given.
#[derive(Default)]
pub struct MapResolver {
    map: Mutex<HashMap<String, IpAddr>>,
    calls: AtomicUsize,
}

impl MapResolver {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        let r = Self::default();
        for (host, addr) in entries {
            r.insert(host, addr);
        }
        r
    }

    pub fn insert(&self, host: &str, addr: &str) {
        self.map.lock().unwrap().insert(host.to_string(), ip(addr));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for MapResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.map
            .lock()
            .unwrap()
            .get(hostname)
            .copied()
            .ok_or_else(|| SyncError::Resolution {
                host: hostname.to_string(),
                reason: "not in map".into(),
            })
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    AlwaysFail,
    AlwaysOk { epoch: i64, stratum: u8 },
    /// Fail the first `fails` queries, then answer.
    FailThenOk { fails: usize, epoch: i64 },
}

/// Per-address behaviour, with optional simulated latency.
#[derive(Default)]
pub struct ScriptedSource {
    behaviors: Mutex<HashMap<IpAddr, Behavior>>,
    latency: Mutex<HashMap<IpAddr, Duration>>,
    calls: Mutex<HashMap<IpAddr, usize>>,
}

impl ScriptedSource {
    pub fn set(&self, addr: &str, behavior: Behavior) {
        self.behaviors.lock().unwrap().insert(ip(addr), behavior);
    }

    pub fn set_latency(&self, addr: &str, latency: Duration) {
        self.latency.lock().unwrap().insert(ip(addr), latency);
    }

    pub fn calls_to(&self, addr: &str) -> usize {
        self.calls.lock().unwrap().get(&ip(addr)).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl TimeSource for ScriptedSource {
    async fn query_time(&self, addr: IpAddr, _timeout: Duration) -> Result<TimeSample, SyncError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(addr).or_insert(0);
            *n += 1;
            *n
        };
        let latency = self.latency.lock().unwrap().get(&addr).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&addr)
            .copied()
            .unwrap_or(Behavior::AlwaysFail);
        let ok = |epoch: i64, stratum: u8| -> Result<TimeSample, SyncError> {
            Ok(TimeSample {
                utc_epoch: epoch,
                stratum,
                round_trip: latency.unwrap_or_default(),
            })
        };
        match behavior {
            Behavior::AlwaysFail => Err(SyncError::QueryTimeout(addr.to_string())),
            Behavior::AlwaysOk { epoch, stratum } => ok(epoch, stratum),
            Behavior::FailThenOk { fails, epoch } if n > fails => ok(epoch, 1),
            Behavior::FailThenOk { .. } => Err(SyncError::QueryTimeout(addr.to_string())),
        }
    }
}

/// Records every step; `now_epoch` returns the last value set.
#[derive(Default)]
pub struct RecordingClock {
    now: AtomicI64,
    sets: Mutex<Vec<i64>>,
}

impl RecordingClock {
    pub fn sets(&self) -> Vec<i64> {
        self.sets.lock().unwrap().clone()
    }
}

impl SystemClock for RecordingClock {
    fn now_epoch(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn set_epoch(&self, epoch: i64) -> Result<(), ClockError> {
        self.now.store(epoch, Ordering::SeqCst);
        self.sets.lock().unwrap().push(epoch);
        Ok(())
    }
}

/// Clock that refuses every step.
pub struct RefusingClock;

impl SystemClock for RefusingClock {
    fn now_epoch(&self) -> i64 {
        0
    }

    fn set_epoch(&self, _: i64) -> Result<(), ClockError> {
        Err(ClockError::NotSupported)
    }
}

/// Store whose every access fails.
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _: &str, _: &str) -> Result<Option<i64>, SyncError> {
        Err(SyncError::PersistenceUnavailable("broken".into()))
    }

    fn put(&self, _: &str, _: &str, _: i64) -> Result<(), SyncError> {
        Err(SyncError::PersistenceUnavailable("broken".into()))
    }
}

pub struct Harness {
    pub link: Arc<FlagLink>,
    pub resolver: Arc<MapResolver>,
    pub source: Arc<ScriptedSource>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<RecordingClock>,
}

impl Harness {
    pub fn new(resolver: MapResolver) -> Self {
        Self {
            link: Arc::new(FlagLink::default()),
            resolver: Arc::new(resolver),
            source: Arc::new(ScriptedSource::default()),
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(RecordingClock::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            link: self.link.clone(),
            resolver: self.resolver.clone(),
            source: self.source.clone(),
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn engine(&self, max_retries: u32) -> SyncEngine {
        SyncEngine::new(
            self.collaborators(),
            EngineConfig {
                max_retries,
                query_timeout: Duration::from_secs(10),
            },
        )
    }
}
