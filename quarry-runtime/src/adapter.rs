//! The driver adapter contract.
//!
//! Concrete database drivers live outside this crate; the runtime consumes
//! them through this thin async interface. An adapter owns connection
//! creation and teardown, statement execution, streaming, and the
//! transaction verbs.

use crate::transaction::TransactionOptions;
use async_trait::async_trait;
use quarry_core::ast::Value;
use quarry_core::{CompiledQuery, DriverError, QuarryError, QuarryResult};
use tokio::sync::mpsc;

/// One result row with by-name access.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Convenience constructor for tests and adapters.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v))
            .unzip();
        Self { columns, values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| &self.values[i])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What one execution produced.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOutcome {
    pub rows: Vec<Row>,
    pub affected: u64,
    /// Rowid of a single-row insert, where the backend reports one.
    pub last_insert_id: Option<i64>,
}

#[async_trait]
pub trait DriverAdapter: Send + Sync + 'static {
    type Connection: Send + 'static;

    async fn acquire_raw_connection(&self) -> QuarryResult<Self::Connection>;

    async fn destroy_raw_connection(&self, conn: Self::Connection) -> QuarryResult<()>;

    /// Ping or no-op, per backend. Failing connections are destroyed.
    async fn validate_connection(&self, conn: &mut Self::Connection) -> bool {
        let _ = conn;
        true
    }

    async fn execute(
        &self,
        conn: &mut Self::Connection,
        query: &CompiledQuery,
    ) -> Result<ExecuteOutcome, DriverError>;

    /// Forward rows into the sink and return how many were sent. The
    /// default emulates streaming by forwarding a buffered execute; drivers
    /// with real cursors override it. A closed sink means the consumer
    /// cancelled.
    async fn stream(
        &self,
        conn: &mut Self::Connection,
        query: &CompiledQuery,
        batch_size: usize,
        sink: &mpsc::Sender<QuarryResult<Row>>,
    ) -> Result<u64, DriverError> {
        let _ = batch_size;
        let outcome = self.execute(conn, query).await?;
        let mut sent = 0u64;
        for row in outcome.rows {
            if sink.send(Ok(row)).await.is_err() {
                break;
            }
            sent += 1;
        }
        Ok(sent)
    }

    async fn begin(
        &self,
        conn: &mut Self::Connection,
        options: &TransactionOptions,
    ) -> Result<(), DriverError>;

    async fn commit(&self, conn: &mut Self::Connection) -> Result<(), DriverError>;

    async fn rollback(&self, conn: &mut Self::Connection) -> Result<(), DriverError>;

    async fn savepoint(
        &self,
        conn: &mut Self::Connection,
        name: &str,
    ) -> Result<(), DriverError>;

    async fn release_savepoint(
        &self,
        conn: &mut Self::Connection,
        name: &str,
    ) -> Result<(), DriverError>;

    async fn rollback_to_savepoint(
        &self,
        conn: &mut Self::Connection,
        name: &str,
    ) -> Result<(), DriverError>;

    /// Whether in-flight statements can be cancelled. Queries that request
    /// cancel-on-timeout against an adapter without it are rejected at
    /// dispatch.
    fn supports_cancel(&self) -> bool {
        false
    }

    /// Cancel the statement running on the identified connection.
    async fn cancel(&self, connection_uid: u64) -> QuarryResult<()> {
        let _ = connection_uid;
        Err(QuarryError::config("adapter cannot cancel statements"))
    }

    /// Rewrite `?` markers into the driver's placeholder style, where the
    /// driver differs from the dialect's compiled output.
    fn position_bindings(&self, sql: &str) -> String {
        sql.to_string()
    }

    /// Coerce typed values to driver-native form (booleans to 0/1, dates to
    /// text, and so on). The default passes values through.
    fn prep_bindings(&self, values: &[Value]) -> Vec<Value> {
        values.to_vec()
    }
}
