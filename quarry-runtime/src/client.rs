//! The client facade: dialect resolution, pool ownership, terminals.

use crate::adapter::{DriverAdapter, ExecuteOutcome, Row};
use crate::config::{Config, LogOptions, PostProcess};
use crate::events::{Event, EventBus, QueryEvent};
use crate::pool::{Pool, PoolConn};
use crate::runner::{shape_dml, DmlResult, Runner};
use crate::stream::RowStream;
use crate::transaction::{ScopeFuture, Transaction, TransactionOptions};
use quarry_core::ast::{Query, Raw, Value};
use quarry_core::compiler::CompileOptions;
use quarry_core::{CompiledQuery, Dialect, QuarryError, QuarryResult};
use std::sync::Arc;
use tokio::sync::mpsc;

struct ClientInner<A: DriverAdapter> {
    adapter: Arc<A>,
    dialect: &'static dyn Dialect,
    pool: Pool<A>,
    events: EventBus,
    compile_options: CompileOptions,
    post_process: Option<PostProcess>,
    compile_sql_on_error: bool,
    async_stack_traces: bool,
    log: LogOptions,
}

/// Entry point: resolves the dialect, owns the pool, hands out builders and
/// executes them.
pub struct Client<A: DriverAdapter> {
    inner: Arc<ClientInner<A>>,
}

impl<A: DriverAdapter> std::fmt::Debug for Client<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl<A: DriverAdapter> Clone for Client<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: DriverAdapter> Client<A> {
    /// Build a client from configuration and a driver adapter. Unknown
    /// client names fail fast with a configuration error.
    pub fn new(config: Config, adapter: A) -> QuarryResult<Self> {
        let dialect = quarry_core::resolve_dialect(&config.client)?;
        let adapter = Arc::new(adapter);
        let mut pool_options = config.pool.clone();
        if let Some(timeout) = config.acquire_connection_timeout {
            pool_options.acquire_timeout = timeout;
        }
        let pool = Pool::new(adapter.clone(), pool_options);
        let compile_options = CompileOptions {
            default_schema: config.search_path.clone(),
            use_null_as_default: config.use_null_as_default,
            wrap_identifier: config.wrap_identifier.clone(),
        };
        let events = EventBus::new();
        events.emit(&Event::Start);
        Ok(Self {
            inner: Arc::new(ClientInner {
                adapter,
                dialect,
                pool,
                events,
                compile_options,
                post_process: config.post_process_response.clone(),
                compile_sql_on_error: config.compile_sql_on_error,
                async_stack_traces: config.async_stack_traces,
                log: config.log.clone(),
            }),
        })
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.inner.dialect
    }

    pub fn log(&self) -> &LogOptions {
        &self.inner.log
    }

    pub(crate) fn adapter(&self) -> &A {
        &self.inner.adapter
    }

    /// Pool introspection (idle / in-use counts, close).
    pub fn pool(&self) -> &Pool<A> {
        &self.inner.pool
    }

    /// Subscribe to `start` / `query` / `query-response` / `query-error`.
    pub fn on(&self, listener: impl Fn(&Event) + Send + Sync + 'static) {
        self.inner.events.on(listener);
    }

    /// Fresh builder rooted at a table.
    pub fn query(&self, table: impl AsRef<str>) -> Query {
        Query::from_table(table)
    }

    /// Compile without executing.
    pub fn to_sql(&self, query: &Query) -> QuarryResult<CompiledQuery> {
        self.compile(query)
    }

    pub(crate) fn compile(&self, query: &Query) -> QuarryResult<CompiledQuery> {
        let compiled = query.to_sql_with(self.inner.dialect, &self.inner.compile_options)?;
        if let Some(timeout) = compiled.timeout {
            if timeout.cancel && !self.inner.adapter.supports_cancel() {
                return Err(QuarryError::config(
                    "cancel-on-timeout requested but the adapter cannot cancel statements",
                ));
            }
        }
        Ok(compiled)
    }

    // Terminals -------------------------------------------------------------

    pub async fn fetch_all(&self, query: &Query) -> QuarryResult<Vec<Row>> {
        let compiled = self.compile(query)?;
        let outcome = self.run_pooled(&compiled).await?;
        Ok(self.shape_rows(&compiled, outcome.rows))
    }

    /// First row or `None`.
    pub async fn first(&self, query: &Query) -> QuarryResult<Option<Row>> {
        let compiled = self.compile(&query.clone().first())?;
        let outcome = self.run_pooled(&compiled).await?;
        Ok(self.shape_rows(&compiled, outcome.rows).into_iter().next())
    }

    /// Project one column and unwrap to a flat list.
    pub async fn pluck(&self, query: &Query, column: &str) -> QuarryResult<Vec<Value>> {
        let compiled = self.compile(&query.clone().pluck(column))?;
        let outcome = self.run_pooled(&compiled).await?;
        Ok(self.pluck_rows(&compiled, outcome.rows, column))
    }

    /// Run a DML builder and shape the response per dialect capability.
    pub async fn execute(&self, query: &Query) -> QuarryResult<DmlResult> {
        let compiled = self.compile(query)?;
        let outcome = self.run_pooled(&compiled).await?;
        Ok(self.shape_dml_result(&compiled, outcome))
    }

    /// Execute a raw fragment and return the driver's native payload.
    pub async fn raw(&self, raw: impl Into<Raw>) -> QuarryResult<ExecuteOutcome> {
        let compiled = self.compile(&Query::raw(raw))?;
        self.run_pooled(&compiled).await
    }

    /// Execute with row streaming: driver cursors where available, chunked
    /// emulation otherwise. Dropping the stream cancels it.
    pub async fn stream(&self, query: &Query, batch_size: usize) -> QuarryResult<RowStream> {
        let compiled = self.compile(query)?;
        let inner = self.inner.clone();
        let capacity = batch_size.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(async move {
            let mut guard = match inner.pool.acquire().await {
                Ok(guard) => guard,
                Err(err) => {
                    let _ = tx.send(Err(err)).await;
                    return;
                }
            };
            let event = QueryEvent {
                uid: guard.uid,
                tx_id: guard.tx_id,
                sql: compiled.sql.clone(),
                bindings: compiled.bindings.clone(),
                method: compiled.method.clone(),
            };
            inner.events.emit(&Event::Query(event.clone()));
            match inner
                .adapter
                .stream(guard.raw_mut(), &compiled, capacity, &tx)
                .await
            {
                Ok(sent) => inner.events.emit(&Event::QueryResponse {
                    query: event,
                    rows: sent as usize,
                }),
                Err(err) => {
                    let err = inner.dialect.transform_error(&err);
                    let err = if inner.compile_sql_on_error {
                        err.with_sql(&compiled.sql)
                    } else {
                        err
                    };
                    inner.events.emit(&Event::QueryError {
                        query: event,
                        message: err.to_string(),
                    });
                    let _ = tx.send(Err(err)).await;
                }
            }
        });
        Ok(RowStream::new(rx, handle))
    }

    // Transactions ----------------------------------------------------------

    /// Scoped transaction: BEGIN, run the scope, COMMIT on success or
    /// ROLLBACK on failure.
    pub async fn transaction<T, F>(&self, scope: F) -> QuarryResult<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction<A>) -> ScopeFuture<'t, T>,
    {
        self.transaction_with(TransactionOptions::default(), scope)
            .await
    }

    pub async fn transaction_with<T, F>(
        &self,
        options: TransactionOptions,
        scope: F,
    ) -> QuarryResult<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction<A>) -> ScopeFuture<'t, T>,
    {
        let mut tx = Transaction::begin(self.clone(), &options).await?;
        match scope(&mut tx).await {
            Ok(value) => {
                if tx.is_rolled_back() {
                    if options.do_not_reject_on_rollback {
                        Ok(value)
                    } else {
                        Err(QuarryError::transaction("transaction was rolled back"))
                    }
                } else {
                    tx.commit().await?;
                    Ok(value)
                }
            }
            Err(err) => {
                if tx.is_open() {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!(error = %rollback_err, "rollback after scope failure also failed");
                    }
                }
                Err(err)
            }
        }
    }

    /// Transaction provider: a handle whose lifetime the caller manages.
    pub async fn begin(&self) -> QuarryResult<Transaction<A>> {
        Transaction::begin(self.clone(), &TransactionOptions::default()).await
    }

    pub async fn begin_with(&self, options: TransactionOptions) -> QuarryResult<Transaction<A>> {
        Transaction::begin(self.clone(), &options).await
    }

    /// Shut the pool down; further acquires fail.
    pub async fn destroy(&self) {
        self.inner.pool.close().await;
    }

    // Shared plumbing -------------------------------------------------------

    pub(crate) async fn run_on(
        &self,
        conn: &mut PoolConn<A::Connection>,
        compiled: &CompiledQuery,
    ) -> QuarryResult<ExecuteOutcome> {
        Runner {
            adapter: &*self.inner.adapter,
            dialect: self.inner.dialect,
            events: &self.inner.events,
            compile_sql_on_error: self.inner.compile_sql_on_error,
        }
        .run(conn, compiled)
        .await
    }

    async fn run_pooled(&self, compiled: &CompiledQuery) -> QuarryResult<ExecuteOutcome> {
        // Capture the dispatch site eagerly so errors can point back at it.
        let trace = if self.inner.async_stack_traces {
            Some(std::backtrace::Backtrace::capture())
        } else {
            None
        };
        let mut guard = self.inner.pool.acquire().await?;
        let result = self.run_on(guard.conn_mut(), compiled).await;
        if let (Err(err), Some(trace)) = (&result, trace) {
            tracing::error!(error = %err, "query failed, dispatched from:\n{trace}");
        }
        result
    }

    pub(crate) fn shape_rows(&self, compiled: &CompiledQuery, rows: Vec<Row>) -> Vec<Row> {
        match &self.inner.post_process {
            Some(hook) => hook(rows, compiled.context.as_ref()),
            None => rows,
        }
    }

    pub(crate) fn pluck_rows(
        &self,
        compiled: &CompiledQuery,
        rows: Vec<Row>,
        column: &str,
    ) -> Vec<Value> {
        self.shape_rows(compiled, rows)
            .into_iter()
            .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub(crate) fn shape_dml_result(
        &self,
        compiled: &CompiledQuery,
        outcome: ExecuteOutcome,
    ) -> DmlResult {
        match shape_dml(self.inner.dialect, compiled, outcome) {
            DmlResult::Rows(rows) => DmlResult::Rows(self.shape_rows(compiled, rows)),
            other => other,
        }
    }
}
