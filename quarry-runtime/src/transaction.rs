//! Scoped and provider-style transactions over a pinned connection.
//!
//! A transaction owns its connection exclusively for its whole lifetime and
//! walks the state machine open -> committed | rolled-back. Nested
//! transactions are savepoints; rolling one back reverts only its nested
//! work.

use crate::adapter::{DriverAdapter, ExecuteOutcome, Row};
use crate::client::Client;
use crate::pool::PooledConnection;
use crate::runner::DmlResult;
use quarry_core::ast::{Query, Raw, Value};
use quarry_core::{QuarryError, QuarryResult};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "read uncommitted",
            IsolationLevel::ReadCommitted => "read committed",
            IsolationLevel::RepeatableRead => "repeatable read",
            IsolationLevel::Serializable => "serializable",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    pub isolation: Option<IsolationLevel>,
    pub read_only: bool,
    /// Let a scope that rolled back without an error resolve instead of
    /// rejecting.
    pub do_not_reject_on_rollback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Open,
    Committed,
    RolledBack,
}

/// Boxed future a transaction scope returns; borrows the transaction.
pub type ScopeFuture<'t, T> = Pin<Box<dyn Future<Output = QuarryResult<T>> + Send + 't>>;

pub struct Transaction<A: DriverAdapter> {
    client: Client<A>,
    conn: Option<PooledConnection<A>>,
    state: TxState,
    /// Savepoint nesting depth.
    depth: u32,
    tx_id: Uuid,
}

impl<A: DriverAdapter> Transaction<A> {
    pub(crate) async fn begin(
        client: Client<A>,
        options: &TransactionOptions,
    ) -> QuarryResult<Self> {
        let mut guard = client.pool().acquire().await?;
        let tx_id = Uuid::new_v4();
        guard.tx_id = Some(tx_id);
        if let Err(err) = client.adapter().begin(guard.raw_mut(), options).await {
            guard.tx_id = None;
            return Err(QuarryError::transaction(format!(
                "begin failed: {}",
                client.dialect().transform_error(&err)
            )));
        }
        tracing::debug!(tx_id = %tx_id, uid = guard.uid, "transaction begun");
        Ok(Self {
            client,
            conn: Some(guard),
            state: TxState::Open,
            depth: 0,
            tx_id,
        })
    }

    pub fn tx_id(&self) -> Uuid {
        self.tx_id
    }

    pub fn is_open(&self) -> bool {
        self.state == TxState::Open
    }

    pub fn is_rolled_back(&self) -> bool {
        self.state == TxState::RolledBack
    }

    fn ensure_open(&self) -> QuarryResult<()> {
        match self.state {
            TxState::Open => Ok(()),
            TxState::Committed => Err(QuarryError::transaction(
                "transaction already committed",
            )),
            TxState::RolledBack => Err(QuarryError::transaction(
                "transaction already rolled back",
            )),
        }
    }

    fn guard_mut(&mut self) -> &mut PooledConnection<A> {
        self.conn.as_mut().expect("transaction connection present")
    }

    // Query surface --------------------------------------------------------

    pub async fn fetch_all(&mut self, query: &Query) -> QuarryResult<Vec<Row>> {
        self.ensure_open()?;
        let client = self.client.clone();
        let compiled = client.compile(query)?;
        let outcome = client.run_on(self.guard_mut().conn_mut(), &compiled).await?;
        Ok(client.shape_rows(&compiled, outcome.rows))
    }

    pub async fn first(&mut self, query: &Query) -> QuarryResult<Option<Row>> {
        self.ensure_open()?;
        let client = self.client.clone();
        let compiled = client.compile(&query.clone().first())?;
        let outcome = client.run_on(self.guard_mut().conn_mut(), &compiled).await?;
        Ok(client.shape_rows(&compiled, outcome.rows).into_iter().next())
    }

    pub async fn pluck(&mut self, query: &Query, column: &str) -> QuarryResult<Vec<Value>> {
        self.ensure_open()?;
        let client = self.client.clone();
        let compiled = client.compile(&query.clone().pluck(column))?;
        let outcome = client.run_on(self.guard_mut().conn_mut(), &compiled).await?;
        Ok(client.pluck_rows(&compiled, outcome.rows, column))
    }

    pub async fn execute(&mut self, query: &Query) -> QuarryResult<DmlResult> {
        self.ensure_open()?;
        let client = self.client.clone();
        let compiled = client.compile(query)?;
        let outcome = client.run_on(self.guard_mut().conn_mut(), &compiled).await?;
        Ok(client.shape_dml_result(&compiled, outcome))
    }

    pub async fn raw(&mut self, raw: impl Into<Raw>) -> QuarryResult<ExecuteOutcome> {
        self.ensure_open()?;
        let client = self.client.clone();
        let compiled = client.compile(&Query::raw(raw))?;
        client.run_on(self.guard_mut().conn_mut(), &compiled).await
    }

    // Completion -----------------------------------------------------------

    pub async fn commit(mut self) -> QuarryResult<()> {
        self.ensure_open()?;
        let client = self.client.clone();
        client
            .adapter()
            .commit(self.guard_mut().raw_mut())
            .await
            .map_err(|e| {
                QuarryError::transaction(format!(
                    "commit failed: {}",
                    client.dialect().transform_error(&e)
                ))
            })?;
        self.state = TxState::Committed;
        tracing::debug!(tx_id = %self.tx_id, "transaction committed");
        self.release_connection();
        Ok(())
    }

    pub async fn rollback(mut self) -> QuarryResult<()> {
        self.rollback_only().await?;
        self.release_connection();
        Ok(())
    }

    /// Roll back but keep the handle alive; later statements fail with a
    /// transaction error. Scoped transactions use this for
    /// rollback-without-error.
    pub async fn rollback_only(&mut self) -> QuarryResult<()> {
        self.ensure_open()?;
        let client = self.client.clone();
        client
            .adapter()
            .rollback(self.guard_mut().raw_mut())
            .await
            .map_err(|e| {
                QuarryError::transaction(format!(
                    "rollback failed: {}",
                    client.dialect().transform_error(&e)
                ))
            })?;
        self.state = TxState::RolledBack;
        tracing::debug!(tx_id = %self.tx_id, "transaction rolled back");
        Ok(())
    }

    /// Nested transaction as a savepoint: released on success, rolled back
    /// to on failure, leaving the outer transaction open either way.
    pub async fn savepoint<T, F>(&mut self, scope: F) -> QuarryResult<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction<A>) -> ScopeFuture<'t, T>,
    {
        self.ensure_open()?;
        self.depth += 1;
        let name = format!("sp{}", self.depth);
        let client = self.client.clone();
        if let Err(err) = client
            .adapter()
            .savepoint(self.guard_mut().raw_mut(), &name)
            .await
        {
            self.depth -= 1;
            return Err(QuarryError::transaction(format!(
                "savepoint failed: {}",
                client.dialect().transform_error(&err)
            )));
        }

        let result = scope(self).await;
        match result {
            Ok(value) => {
                client
                    .adapter()
                    .release_savepoint(self.guard_mut().raw_mut(), &name)
                    .await
                    .map_err(|e| {
                        QuarryError::transaction(format!(
                            "release savepoint failed: {}",
                            client.dialect().transform_error(&e)
                        ))
                    })?;
                self.depth -= 1;
                Ok(value)
            }
            Err(err) => {
                if let Err(rb) = client
                    .adapter()
                    .rollback_to_savepoint(self.guard_mut().raw_mut(), &name)
                    .await
                {
                    tracing::warn!(tx_id = %self.tx_id, error = %client.dialect().transform_error(&rb), "rollback to savepoint failed");
                }
                self.depth -= 1;
                Err(err)
            }
        }
    }

    /// Clear the transaction pin and let the guard return to the pool.
    fn release_connection(&mut self) {
        if let Some(mut guard) = self.conn.take() {
            guard.tx_id = None;
        }
    }
}

impl<A: DriverAdapter> Drop for Transaction<A> {
    fn drop(&mut self) {
        if self.state != TxState::Open {
            self.release_connection();
            return;
        }
        let Some(mut guard) = self.conn.take() else {
            return;
        };
        tracing::warn!(tx_id = %self.tx_id, "transaction dropped while open, rolling back");
        let client = self.client.clone();
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(async move {
                match client.adapter().rollback(guard.raw_mut()).await {
                    // Clean rollback: the connection may be pooled again.
                    Ok(()) => guard.tx_id = None,
                    // Unknown session state: leave the pin so the pool
                    // destroys it on return.
                    Err(err) => {
                        tracing::warn!(error = %client.dialect().transform_error(&err), "rollback of dropped transaction failed")
                    }
                }
            });
        }
        // Without a runtime the guard's own drop handles cleanup; the pin
        // marks it for destruction.
    }
}
