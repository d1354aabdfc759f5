//! Shepherds a compiled query through execute and post-processing.

use crate::adapter::{DriverAdapter, ExecuteOutcome, Row};
use crate::events::{Event, EventBus, QueryEvent};
use crate::pool::PoolConn;
use quarry_core::{CompiledQuery, Dialect, Method, QuarryError, QuarryResult};

/// Response of a DML terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum DmlResult {
    /// Affected-row count.
    Affected(u64),
    /// RETURNING was requested on a dialect without it; fabricated from the
    /// driver's last-insert id.
    InsertedIds(Vec<i64>),
    /// RETURNING rowset.
    Rows(Vec<Row>),
}

pub(crate) struct Runner<'a, A: DriverAdapter> {
    pub adapter: &'a A,
    pub dialect: &'static dyn Dialect,
    pub events: &'a EventBus,
    pub compile_sql_on_error: bool,
}

impl<'a, A: DriverAdapter> Runner<'a, A> {
    /// Execute on the given connection: emit `query`, run with the optional
    /// statement timeout, normalize errors through the dialect, emit
    /// `query-response` or `query-error`.
    pub(crate) async fn run(
        &self,
        conn: &mut PoolConn<A::Connection>,
        compiled: &CompiledQuery,
    ) -> QuarryResult<ExecuteOutcome> {
        let event = QueryEvent {
            uid: conn.uid,
            tx_id: conn.tx_id,
            sql: compiled.sql.clone(),
            bindings: compiled.bindings.clone(),
            method: compiled.method.clone(),
        };
        self.events.emit(&Event::Query(event.clone()));

        match self.execute_with_timeout(conn, compiled).await {
            Ok(outcome) => {
                self.events.emit(&Event::QueryResponse {
                    query: event,
                    rows: outcome.rows.len(),
                });
                Ok(outcome)
            }
            Err(err) => {
                let err = if self.compile_sql_on_error {
                    err.with_sql(&compiled.sql)
                } else {
                    err
                };
                self.events.emit(&Event::QueryError {
                    query: event,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn execute_with_timeout(
        &self,
        conn: &mut PoolConn<A::Connection>,
        compiled: &CompiledQuery,
    ) -> QuarryResult<ExecuteOutcome> {
        let uid = conn.uid;
        let Some(timeout) = compiled.timeout else {
            return self
                .adapter
                .execute(conn.raw_mut(), compiled)
                .await
                .map_err(|e| self.dialect.transform_error(&e));
        };
        match tokio::time::timeout(
            timeout.duration,
            self.adapter.execute(conn.raw_mut(), compiled),
        )
        .await
        {
            Ok(result) => result.map_err(|e| self.dialect.transform_error(&e)),
            Err(_) => {
                if timeout.cancel {
                    if let Err(err) = self.adapter.cancel(uid).await {
                        tracing::warn!(uid, error = %err, "statement cancel failed");
                    }
                }
                // Without cancel the statement keeps running server-side.
                Err(QuarryError::Timeout(format!(
                    "statement exceeded {:?}",
                    timeout.duration
                )))
            }
        }
    }
}

/// Shape a DML response per the compiled method and dialect capability.
pub(crate) fn shape_dml(
    dialect: &dyn Dialect,
    compiled: &CompiledQuery,
    outcome: ExecuteOutcome,
) -> DmlResult {
    let wants_returning = compiled.returning.is_some();
    if wants_returning && dialect.supports_returning() {
        return DmlResult::Rows(outcome.rows);
    }
    if wants_returning && compiled.method == Method::Insert {
        if let Some(id) = outcome.last_insert_id {
            return DmlResult::InsertedIds(vec![id]);
        }
    }
    DmlResult::Affected(outcome.affected)
}
