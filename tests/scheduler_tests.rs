mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Behavior, Harness, MapResolver, REPORTED_EPOCH};
use ntpsync::adapters::KeyValueStore;
use ntpsync::{Intervals, SyncClient, SyncError, TaskOptions};

fn client_for(h: &Harness, max_retries: u32) -> SyncClient {
    SyncClient::builder()
        .link(h.link.clone())
        .resolver(h.resolver.clone())
        .source(h.source.clone())
        .store(h.store.clone())
        .clock(h.clock.clone())
        .max_retries(max_retries)
        .build()
}

fn harness() -> Harness {
    Harness::new(MapResolver::with(&[("time.test", "192.0.2.9")]))
}

#[tokio::test(start_paused = true)]
async fn test_success_waits_sync_interval() {
    let h = harness();
    h.source.set(
        "192.0.2.9",
        Behavior::AlwaysOk {
            epoch: REPORTED_EPOCH,
            stratum: 2,
        },
    );
    let client = client_for(&h, 3);
    client.configure("UTC", ["time.test"]).await;
    client.set_intervals(60, 5);

    let _task = client.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(client.is_synced().await);
    assert_eq!(client.last_sync_time().await, REPORTED_EPOCH);
    assert_eq!(h.source.total_calls(), 1);

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(h.source.total_calls(), 1);

    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    assert_eq!(h.source.total_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failure_waits_retry_interval() {
    let h = harness();
    h.source.set("192.0.2.9", Behavior::AlwaysFail);
    let client = client_for(&h, 1);
    client.configure("UTC", ["time.test"]).await;
    client.set_intervals(60, 5);

    let _task = client.start().await.unwrap();
    // attempts at 0, 5 and 10 minutes
    tokio::time::sleep(Duration::from_secs(11 * 60)).await;
    assert_eq!(h.source.total_calls(), 3);
    assert!(!client.is_synced().await);
}

#[tokio::test(start_paused = true)]
async fn test_interval_change_applies_next_cycle() {
    let h = harness();
    h.source.set(
        "192.0.2.9",
        Behavior::AlwaysOk {
            epoch: REPORTED_EPOCH,
            stratum: 2,
        },
    );
    let client = client_for(&h, 1);
    client.configure("UTC", ["time.test"]).await;
    client.set_intervals(60, 5);
    let _task = client.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    // current sleep keeps its 60 min; the following one uses 10 min
    client.set_intervals(10, 1);
    assert_eq!(client.intervals(), Intervals::from_minutes(10, 1));
    tokio::time::sleep(Duration::from_secs(60 * 60)).await;
    assert_eq!(h.source.total_calls(), 2);
    tokio::time::sleep(Duration::from_secs(10 * 60)).await;
    assert_eq!(h.source.total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_rejected() {
    let h = harness();
    let client = client_for(&h, 1);
    client.configure("UTC", ["time.test"]).await;

    let _task = client.start().await.unwrap();
    assert!(client.is_running());
    assert!(matches!(
        client.start().await,
        Err(SyncError::AlreadyRunning)
    ));
    assert!(matches!(
        client.start_dedicated(&TaskOptions::default()),
        Err(SyncError::AlreadyRunning)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_start_restores_persisted_clock() {
    let h = harness();
    h.store.put("ntp", "lastSync", 1_600_000_000).unwrap();
    h.source.set("192.0.2.9", Behavior::AlwaysFail);
    let client = client_for(&h, 1);
    client.configure("UTC", ["time.test"]).await;

    let _task = client.start().await.unwrap();
    assert_eq!(h.clock.sets(), vec![1_600_000_000]);
    assert_eq!(client.last_sync_time().await, 1_600_000_000);
}

#[test]
fn test_dedicated_thread_runs_outside_runtime() {
    let h = harness();
    h.source.set(
        "192.0.2.9",
        Behavior::AlwaysOk {
            epoch: REPORTED_EPOCH,
            stratum: 2,
        },
    );
    let client = Arc::new(client_for(&h, 1));
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    rt.block_on(client.configure("UTC", ["time.test"]));

    let options = TaskOptions {
        name: "sync-test".into(),
        stack_size: 256 * 1024,
    };
    let _thread = client.start_dedicated(&options).unwrap();

    let mut synced = false;
    for _ in 0..200 {
        if rt.block_on(client.is_synced()) {
            synced = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(synced, "dedicated scheduler never synced");
    assert_eq!(h.source.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_starts_restore_once() {
    let h = harness();
    h.store.put("ntp", "lastSync", 1_600_000_000).unwrap();
    h.source.set("192.0.2.9", Behavior::AlwaysFail);
    h.source.set_latency("192.0.2.9", Duration::from_secs(5));
    let client = Arc::new(client_for(&h, 1));
    client.configure("UTC", ["time.test"]).await;

    // an in-flight attempt holds the engine while both starts race
    let busy = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.sync_now().await }
    });
    tokio::task::yield_now().await;

    let (first, second) = tokio::join!(client.start(), client.start());
    assert!(first.is_ok());
    assert!(matches!(second, Err(SyncError::AlreadyRunning)));
    assert_eq!(h.clock.sets(), vec![1_600_000_000]);
    assert!(busy.await.unwrap().is_err());
}
