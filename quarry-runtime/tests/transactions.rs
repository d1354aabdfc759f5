//! Transaction scoping, savepoints, and state-machine enforcement.

mod common;

use common::MockAdapter;
use quarry_core::QuarryError;
use quarry_runtime::{Client, Config, IsolationLevel, TransactionOptions};
use std::time::Duration;

fn client(adapter: &MockAdapter) -> Client<MockAdapter> {
    Client::new(Config::new("pg"), adapter.clone()).unwrap()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn scope_commits_on_success() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    let value = client
        .transaction(|tx| {
            Box::pin(async move {
                tx.execute(&quarry_runtime::Query::from_table("users").insert([("name", "Ada")]))
                    .await?;
                Ok(7)
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(
        adapter.statements(),
        vec![
            "BEGIN".to_string(),
            r#"insert into "users" ("name") values ($1)"#.to_string(),
            "COMMIT".to_string(),
        ]
    );

    settle().await;
    assert_eq!(client.pool().in_use_count().await, 0);
    assert_eq!(client.pool().idle_count().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_scope_rolls_back_and_surfaces_the_error() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    let err = client
        .transaction::<(), _>(|tx| {
            Box::pin(async move {
                tx.execute(&quarry_runtime::Query::from_table("users").insert([("name", "Ada")]))
                    .await?;
                Err(QuarryError::Driver("boom".into()))
            })
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Driver(_)));
    // Exactly BEGIN, the insert, ROLLBACK; nothing else.
    assert_eq!(
        adapter.statements(),
        vec![
            "BEGIN".to_string(),
            r#"insert into "users" ("name") values ($1)"#.to_string(),
            "ROLLBACK".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_handle_commits_manually() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    let mut tx = client.begin().await.unwrap();
    tx.execute(&quarry_runtime::Query::from_table("t").set("x", 1))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(
        adapter.statements(),
        vec![
            "BEGIN".to_string(),
            r#"update "t" set "x" = $1"#.to_string(),
            "COMMIT".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn finished_transaction_refuses_further_work() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    let mut tx = client.begin().await.unwrap();
    tx.rollback_only().await.unwrap();
    let err = tx
        .execute(&quarry_runtime::Query::from_table("t").set("x", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Transaction(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn savepoints_nest_and_roll_back_partially() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    client
        .transaction(|tx| {
            Box::pin(async move {
                tx.execute(&quarry_runtime::Query::from_table("t").insert([("a", 1)]))
                    .await?;
                let nested: Result<(), QuarryError> = tx
                    .savepoint(|tx| {
                        Box::pin(async move {
                            tx.execute(
                                &quarry_runtime::Query::from_table("t").insert([("a", 2)]),
                            )
                            .await?;
                            Err(QuarryError::Driver("inner failure".into()))
                        })
                    })
                    .await;
                assert!(nested.is_err());
                Ok(())
            })
        })
        .await
        .unwrap();

    assert_eq!(
        adapter.statements(),
        vec![
            "BEGIN".to_string(),
            r#"insert into "t" ("a") values ($1)"#.to_string(),
            "SAVEPOINT sp1".to_string(),
            r#"insert into "t" ("a") values ($1)"#.to_string(),
            "ROLLBACK TO SAVEPOINT sp1".to_string(),
            "COMMIT".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn savepoint_releases_on_success() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    client
        .transaction(|tx| {
            Box::pin(async move {
                tx.savepoint(|tx| {
                    Box::pin(async move {
                        tx.execute(&quarry_runtime::Query::from_table("t").insert([("a", 2)]))
                            .await?;
                        Ok(())
                    })
                })
                .await
            })
        })
        .await
        .unwrap();

    let statements = adapter.statements();
    assert!(statements.contains(&"SAVEPOINT sp1".to_string()));
    assert!(statements.contains(&"RELEASE SAVEPOINT sp1".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn isolation_and_read_only_are_issued_with_begin() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    let options = TransactionOptions {
        isolation: Some(IsolationLevel::Serializable),
        read_only: true,
        do_not_reject_on_rollback: false,
    };
    let tx = client.begin_with(options).await.unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(
        adapter.statements(),
        vec![
            "BEGIN isolation level serializable read only".to_string(),
            "ROLLBACK".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn rollback_without_error_honors_the_flag() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    // Default: a silent rollback rejects the scope's value.
    let err = client
        .transaction(|tx| {
            Box::pin(async move {
                tx.rollback_only().await?;
                Ok(1)
            })
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Transaction(_)));

    // With the flag the scope's value resolves.
    let options = TransactionOptions {
        do_not_reject_on_rollback: true,
        ..Default::default()
    };
    let value = client
        .transaction_with(options, |tx| {
            Box::pin(async move {
                tx.rollback_only().await?;
                Ok(2)
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_open_transaction_rolls_back() {
    let adapter = MockAdapter::new();
    let client = client(&adapter);

    let tx = client.begin().await.unwrap();
    drop(tx);
    settle().await;
    assert_eq!(
        adapter.statements(),
        vec!["BEGIN".to_string(), "ROLLBACK".to_string()]
    );
}
