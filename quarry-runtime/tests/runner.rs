//! Runner post-processing, events, error normalization, timeouts.

mod common;

use common::MockAdapter;
use quarry_core::ast::Value;
use quarry_core::{ConstraintKind, QuarryError};
use quarry_runtime::adapter::{ExecuteOutcome, Row};
use quarry_runtime::{Client, Config, DmlResult, Event};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn client(dialect: &str, adapter: &MockAdapter) -> Client<MockAdapter> {
    Client::new(Config::new(dialect), adapter.clone()).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_all_returns_rows() {
    let adapter = MockAdapter::new();
    adapter.push_rows(vec![
        Row::from_pairs([("id", Value::Int(1)), ("name", Value::from("Ada"))]),
        Row::from_pairs([("id", Value::Int(2)), ("name", Value::from("Grace"))]),
    ]);
    let client = client("pg", &adapter);

    let rows = client
        .fetch_all(&client.query("users").select(["id", "name"]))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Ada")));
    assert_eq!(
        adapter.statements(),
        vec![r#"select "id", "name" from "users""#.to_string()]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn first_limits_and_unwraps() {
    let adapter = MockAdapter::new();
    adapter.push_rows(vec![Row::from_pairs([("id", Value::Int(9))])]);
    let client = client("pg", &adapter);

    let row = client.first(&client.query("users")).await.unwrap();
    assert_eq!(row.unwrap().get("id"), Some(&Value::Int(9)));
    assert_eq!(
        adapter.statements(),
        vec![r#"select * from "users" limit $1"#.to_string()]
    );

    let missing = client.first(&client.query("users")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn pluck_flattens_one_column() {
    let adapter = MockAdapter::new();
    adapter.push_rows(vec![
        Row::from_pairs([("name", Value::from("Ada"))]),
        Row::from_pairs([("name", Value::from("Grace"))]),
    ]);
    let client = client("pg", &adapter);

    let names = client.pluck(&client.query("users"), "name").await.unwrap();
    assert_eq!(names, vec![Value::from("Ada"), Value::from("Grace")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn insert_without_returning_support_fabricates_rowid() {
    let adapter = MockAdapter::new();
    adapter.push_outcome(ExecuteOutcome {
        rows: vec![],
        affected: 1,
        last_insert_id: Some(41),
    });
    let client = client("sqlite", &adapter);

    let result = client
        .execute(
            &client
                .query("users")
                .insert([("name", "Alice")])
                .returning(["id"]),
        )
        .await
        .unwrap();
    assert_eq!(result, DmlResult::InsertedIds(vec![41]));
    assert_eq!(
        adapter.statements(),
        vec![r#"insert into "users" ("name") values (?)"#.to_string()]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn insert_with_returning_support_returns_rows() {
    let adapter = MockAdapter::new();
    adapter.push_rows(vec![Row::from_pairs([
        ("id", Value::Int(1)),
        ("name", Value::from("Alice")),
    ])]);
    let client = client("pg", &adapter);

    let result = client
        .execute(
            &client
                .query("users")
                .insert([("name", "Alice")])
                .returning_all(),
        )
        .await
        .unwrap();
    match result {
        DmlResult::Rows(rows) => {
            assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));
        }
        other => panic!("expected rows, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn update_without_returning_reports_affected() {
    let adapter = MockAdapter::new();
    adapter.push_outcome(ExecuteOutcome {
        rows: vec![],
        affected: 3,
        last_insert_id: None,
    });
    let client = client("pg", &adapter);

    let result = client
        .execute(&client.query("users").set("active", false))
        .await
        .unwrap();
    assert_eq!(result, DmlResult::Affected(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn events_fire_in_order_with_payload() {
    let adapter = MockAdapter::new();
    adapter.push_rows(vec![]);
    let client = client("pg", &adapter);

    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = seen.clone();
    client.on(move |event| {
        let label = match event {
            Event::Start => "start".to_string(),
            Event::Query(q) => format!("query:{}", q.sql),
            Event::QueryResponse { rows, .. } => format!("response:{}", rows),
            Event::QueryError { .. } => "error".to_string(),
        };
        sink.lock().unwrap().push(label);
    });

    client
        .fetch_all(&client.query("users").where_eq("id", 1))
        .await
        .unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            r#"query:select * from "users" where "id" = $1"#.to_string(),
            "response:0".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn driver_errors_are_normalized_and_decorated() {
    let adapter = MockAdapter::new();
    adapter.push_error("23505", "duplicate key value");
    let client = client("pg", &adapter);

    let err = client
        .execute(&client.query("users").insert([("id", 1)]))
        .await
        .unwrap_err();
    match &err {
        QuarryError::Constraint { kind, message } => {
            assert_eq!(*kind, ConstraintKind::Unique);
            assert!(message.contains("while executing: insert into"));
        }
        other => panic!("expected constraint error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sql_decoration_can_be_disabled() {
    let adapter = MockAdapter::new();
    adapter.push_error("42601", "syntax error near");
    let client = Client::new(
        Config::new("pg").compile_sql_on_error(false),
        adapter.clone(),
    )
    .unwrap();

    let err = client.fetch_all(&client.query("users")).await.unwrap_err();
    match err {
        QuarryError::Syntax(message) => assert!(!message.contains("while executing")),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn post_process_response_hook_runs() {
    let adapter = MockAdapter::new();
    adapter.push_rows(vec![Row::from_pairs([("n", Value::Int(1))])]);
    let config = Config::new("pg").post_process_response(Arc::new(|rows, _context| {
        rows.into_iter()
            .map(|row| {
                Row::from_pairs(
                    row.columns()
                        .iter()
                        .zip(row.values())
                        .map(|(c, v)| (c.clone(), v.clone()))
                        .chain(std::iter::once(("extra".to_string(), Value::Bool(true)))),
                )
            })
            .collect()
    }));
    let client = Client::new(config, adapter.clone()).unwrap();

    let rows = client.fetch_all(&client.query("t")).await.unwrap();
    assert_eq!(rows[0].get("extra"), Some(&Value::Bool(true)));
}

#[tokio::test(flavor = "multi_thread")]
async fn raw_returns_native_payload() {
    let adapter = MockAdapter::new();
    adapter.push_outcome(ExecuteOutcome {
        rows: vec![Row::from_pairs([("v", Value::Int(1))])],
        affected: 0,
        last_insert_id: None,
    });
    let client = client("pg", &adapter);

    let outcome = client
        .raw(quarry_core::ast::Raw::bind("select ?::int as v", [1]))
        .await
        .unwrap();
    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(adapter.statements(), vec!["select $1::int as v".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn statement_timeout_surfaces_timeout_error() {
    let adapter = MockAdapter::new();
    adapter.set_execute_delay(Some(Duration::from_millis(300)));
    let client = client("pg", &adapter);

    let err = client
        .fetch_all(&client.query("slow").timeout(50))
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Timeout(_)));
    assert_eq!(adapter.cancelled(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn timeout_with_cancel_asks_the_driver() {
    let adapter = MockAdapter::new();
    adapter.set_execute_delay(Some(Duration::from_millis(300)));
    adapter.allow_cancel(true);
    let client = client("pg", &adapter);

    let err = client
        .fetch_all(&client.query("slow").timeout_with_cancel(50))
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Timeout(_)));
    assert_eq!(adapter.cancelled(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_request_rejected_without_support() {
    let adapter = MockAdapter::new();
    let client = client("pg", &adapter);

    let err = client
        .fetch_all(&client.query("slow").timeout_with_cancel(50))
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Config(_)));
    assert!(adapter.statements().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_client_name_fails_fast() {
    let err = Client::new(Config::new("access97"), MockAdapter::new()).unwrap_err();
    assert!(matches!(err, QuarryError::Config(_)));
}
