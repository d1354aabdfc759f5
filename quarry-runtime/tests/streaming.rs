//! Row streaming: lazy consumption, exhaustion, cancellation, leak-freedom.

mod common;

use common::MockAdapter;
use quarry_core::ast::Value;
use quarry_runtime::adapter::Row;
use quarry_runtime::{Client, Config};
use std::time::Duration;

fn client(adapter: &MockAdapter) -> Client<MockAdapter> {
    Client::new(Config::new("pg"), adapter.clone()).unwrap()
}

fn sample_rows(n: i64) -> Vec<Row> {
    (0..n)
        .map(|i| Row::from_pairs([("n", Value::Int(i))]))
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_yields_every_row_in_order() {
    let adapter = MockAdapter::new();
    adapter.push_rows(sample_rows(5));
    let client = client(&adapter);

    let mut stream = client.stream(&client.query("numbers"), 2).await.unwrap();
    let mut seen = Vec::new();
    while let Some(row) = stream.next().await {
        seen.push(row.unwrap().get("n").cloned().unwrap());
    }
    assert_eq!(
        seen,
        (0..5).map(Value::Int).collect::<Vec<_>>()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn collect_drains_the_stream() {
    let adapter = MockAdapter::new();
    adapter.push_rows(sample_rows(3));
    let client = client(&adapter);

    let stream = client.stream(&client.query("numbers"), 1).await.unwrap();
    let rows = stream.collect().await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_the_stream_releases_the_connection() {
    let adapter = MockAdapter::new();
    adapter.push_rows(sample_rows(100));
    let client = client(&adapter);

    let mut stream = client.stream(&client.query("numbers"), 1).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.get("n"), Some(&Value::Int(0)));
    drop(stream);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.pool().in_use_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_surfaces_driver_errors() {
    let adapter = MockAdapter::new();
    adapter.push_error("42601", "bad sql");
    let client = client(&adapter);

    let mut stream = client.stream(&client.query("numbers"), 4).await.unwrap();
    let item = stream.next().await.unwrap();
    assert!(item.is_err());
    assert!(stream.next().await.is_none());
}
