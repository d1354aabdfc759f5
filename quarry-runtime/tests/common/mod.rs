//! Scriptable in-memory adapter shared by the integration tests.

use async_trait::async_trait;
use quarry_core::{CompiledQuery, DriverError, QuarryError, QuarryResult};
use quarry_runtime::adapter::{DriverAdapter, ExecuteOutcome, Row};
use quarry_runtime::transaction::TransactionOptions;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct MockConn {
    #[allow(dead_code)]
    pub id: u64,
}

#[derive(Default)]
struct MockState {
    statements: Mutex<Vec<String>>,
    outcomes: Mutex<VecDeque<Result<ExecuteOutcome, DriverError>>>,
    created: AtomicU64,
    destroyed: AtomicU64,
    fail_validation: AtomicBool,
    fail_create: AtomicBool,
    execute_delay: Mutex<Option<Duration>>,
    can_cancel: AtomicBool,
    cancelled: AtomicU64,
}

/// Cloneable handle over shared scripted state, so tests keep a view into
/// the adapter after handing it to the client.
#[derive(Clone, Default)]
pub struct MockAdapter {
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(&self, outcome: ExecuteOutcome) {
        self.state.outcomes.lock().unwrap().push_back(Ok(outcome));
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        let affected = rows.len() as u64;
        self.push_outcome(ExecuteOutcome {
            rows,
            affected,
            last_insert_id: None,
        });
    }

    pub fn push_error(&self, code: &str, message: &str) {
        self.state
            .outcomes
            .lock()
            .unwrap()
            .push_back(Err(DriverError::new(code, message)));
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().unwrap().clone()
    }

    pub fn created(&self) -> u64 {
        self.state.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> u64 {
        self.state.destroyed.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> u64 {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    pub fn fail_validation(&self, yes: bool) {
        self.state.fail_validation.store(yes, Ordering::SeqCst);
    }

    pub fn fail_create(&self, yes: bool) {
        self.state.fail_create.store(yes, Ordering::SeqCst);
    }

    pub fn set_execute_delay(&self, delay: Option<Duration>) {
        *self.state.execute_delay.lock().unwrap() = delay;
    }

    pub fn allow_cancel(&self, yes: bool) {
        self.state.can_cancel.store(yes, Ordering::SeqCst);
    }

    fn record(&self, statement: impl Into<String>) {
        self.state.statements.lock().unwrap().push(statement.into());
    }
}

#[async_trait]
impl DriverAdapter for MockAdapter {
    type Connection = MockConn;

    async fn acquire_raw_connection(&self) -> QuarryResult<MockConn> {
        if self.state.fail_create.load(Ordering::SeqCst) {
            return Err(QuarryError::connection("mock create failure"));
        }
        let id = self.state.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockConn { id })
    }

    async fn destroy_raw_connection(&self, _conn: MockConn) -> QuarryResult<()> {
        self.state.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn validate_connection(&self, _conn: &mut MockConn) -> bool {
        !self.state.fail_validation.load(Ordering::SeqCst)
    }

    async fn execute(
        &self,
        _conn: &mut MockConn,
        query: &CompiledQuery,
    ) -> Result<ExecuteOutcome, DriverError> {
        let delay = *self.state.execute_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(query.sql.clone());
        self.state
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExecuteOutcome::default()))
    }

    async fn begin(
        &self,
        _conn: &mut MockConn,
        options: &TransactionOptions,
    ) -> Result<(), DriverError> {
        let mut stmt = String::from("BEGIN");
        if let Some(isolation) = options.isolation {
            stmt.push_str(" isolation level ");
            stmt.push_str(isolation.as_sql());
        }
        if options.read_only {
            stmt.push_str(" read only");
        }
        self.record(stmt);
        Ok(())
    }

    async fn commit(&self, _conn: &mut MockConn) -> Result<(), DriverError> {
        self.record("COMMIT");
        Ok(())
    }

    async fn rollback(&self, _conn: &mut MockConn) -> Result<(), DriverError> {
        self.record("ROLLBACK");
        Ok(())
    }

    async fn savepoint(&self, _conn: &mut MockConn, name: &str) -> Result<(), DriverError> {
        self.record(format!("SAVEPOINT {}", name));
        Ok(())
    }

    async fn release_savepoint(
        &self,
        _conn: &mut MockConn,
        name: &str,
    ) -> Result<(), DriverError> {
        self.record(format!("RELEASE SAVEPOINT {}", name));
        Ok(())
    }

    async fn rollback_to_savepoint(
        &self,
        _conn: &mut MockConn,
        name: &str,
    ) -> Result<(), DriverError> {
        self.record(format!("ROLLBACK TO SAVEPOINT {}", name));
        Ok(())
    }

    fn supports_cancel(&self) -> bool {
        self.state.can_cancel.load(Ordering::SeqCst)
    }

    async fn cancel(&self, _connection_uid: u64) -> QuarryResult<()> {
        self.state.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
