//! Pool bounds, waiter behavior, validation recycling, and eviction.

mod common;

use common::MockAdapter;
use quarry_core::QuarryError;
use quarry_runtime::pool::{Pool, PoolOptions};
use std::sync::Arc;
use std::time::Duration;

fn pool(adapter: &MockAdapter, options: PoolOptions) -> Pool<MockAdapter> {
    Pool::new(Arc::new(adapter.clone()), options)
}

/// Let spawned return-to-pool tasks settle.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn in_use_plus_idle_never_exceeds_max() {
    let adapter = MockAdapter::new();
    let pool = pool(&adapter, PoolOptions::new(0, 2));

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    assert_eq!(pool.in_use_count().await, 2);
    assert_eq!(pool.idle_count().await, 0);
    assert_eq!(adapter.created(), 2);

    drop(a);
    drop(b);
    settle().await;
    assert_eq!(pool.in_use_count().await, 0);
    assert_eq!(pool.idle_count().await, 2);
    assert!(pool.in_use_count().await + pool.idle_count().await <= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn waiter_is_served_when_a_connection_returns() {
    let adapter = MockAdapter::new();
    let pool = pool(&adapter, PoolOptions::new(0, 1));

    let held = pool.acquire().await.unwrap();
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    drop(held);
    let guard = waiter.await.unwrap().unwrap();
    // The released connection was reused, not recreated.
    assert_eq!(adapter.created(), 1);
    drop(guard);
}

#[tokio::test(flavor = "multi_thread")]
async fn acquire_times_out_when_exhausted() {
    let adapter = MockAdapter::new();
    let pool = pool(
        &adapter,
        PoolOptions::new(0, 1).acquire_timeout(Duration::from_millis(100)),
    );

    let _held = pool.acquire().await.unwrap();
    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, QuarryError::Timeout(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_validation_destroys_and_recreates() {
    let adapter = MockAdapter::new();
    let pool = pool(&adapter, PoolOptions::new(0, 2));

    let guard = pool.acquire().await.unwrap();
    drop(guard);
    settle().await;
    assert_eq!(pool.idle_count().await, 1);

    // The idle connection fails validation and is destroyed; a freshly
    // created one is handed out instead.
    adapter.fail_validation(true);
    let guard = pool.acquire().await.unwrap();
    assert_eq!(adapter.destroyed(), 1);
    assert_eq!(adapter.created(), 2);
    drop(guard);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_error_propagates_when_configured() {
    let adapter = MockAdapter::new();
    adapter.fail_create(true);

    let propagating = pool(
        &adapter,
        PoolOptions::new(0, 1).propagate_create_error(true),
    );
    let err = propagating.acquire().await.unwrap_err();
    assert!(matches!(err, QuarryError::Connection(_)));

    // Without propagation the pool retries until the acquire timeout.
    let retrying = pool(
        &adapter,
        PoolOptions::new(0, 1)
            .acquire_timeout(Duration::from_millis(120))
            .create_retry_interval(Duration::from_millis(20)),
    );
    let err = retrying.acquire().await.unwrap_err();
    assert!(matches!(err, QuarryError::Timeout(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn reaper_evicts_idle_connections_beyond_min() {
    let adapter = MockAdapter::new();
    let pool = pool(
        &adapter,
        PoolOptions::new(0, 4).idle_timeout(Duration::from_millis(50)),
    );

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    drop(a);
    drop(b);
    settle().await;
    assert_eq!(pool.idle_count().await, 2);

    // The reaper ticks once a second.
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert_eq!(pool.idle_count().await, 0);
    assert_eq!(adapter.destroyed(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn close_rejects_new_acquires() {
    let adapter = MockAdapter::new();
    let pool = pool(&adapter, PoolOptions::new(0, 2));

    let guard = pool.acquire().await.unwrap();
    drop(guard);
    settle().await;

    pool.close().await;
    assert_eq!(adapter.destroyed(), 1);
    assert!(pool.acquire().await.is_err());
}
