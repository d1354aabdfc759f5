//! Bounded connection pool.
//!
//! Idle connections are kept LIFO to maximize cache locality; waiters queue
//! FIFO on a fair semaphore. A periodic reaper evicts connections idle past
//! `idle_timeout`, keeping at least `min` alive. Each connection wears a
//! process-unique `uid` for logging and event payloads.

use crate::adapter::DriverAdapter;
use quarry_core::{QuarryError, QuarryResult};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    pub min: usize,
    pub max: usize,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
    pub create_timeout: Duration,
    pub destroy_timeout: Duration,
    pub create_retry_interval: Duration,
    /// Surface connection-creation failures to the waiter instead of
    /// retrying until the acquire timeout.
    pub propagate_create_error: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min: 2,
            max: 10,
            idle_timeout: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(60),
            create_timeout: Duration::from_secs(30),
            destroy_timeout: Duration::from_secs(5),
            create_retry_interval: Duration::from_millis(200),
            propagate_create_error: false,
        }
    }
}

impl PoolOptions {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            ..Default::default()
        }
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = timeout;
        self
    }

    pub fn create_retry_interval(mut self, interval: Duration) -> Self {
        self.create_retry_interval = interval;
        self
    }

    pub fn propagate_create_error(mut self, yes: bool) -> Self {
        self.propagate_create_error = yes;
        self
    }
}

/// Hook run once per freshly created connection.
pub type AfterCreate<C> = Arc<dyn Fn(&mut C) -> QuarryResult<()> + Send + Sync>;

/// A pooled connection with its bookkeeping identity.
pub struct PoolConn<C> {
    pub uid: u64,
    /// Set while the connection is pinned to an open transaction.
    pub tx_id: Option<Uuid>,
    raw: C,
}

impl<C> PoolConn<C> {
    pub fn raw(&self) -> &C {
        &self.raw
    }

    pub fn raw_mut(&mut self) -> &mut C {
        &mut self.raw
    }
}

struct IdleEntry<C> {
    conn: PoolConn<C>,
    since: Instant,
}

struct PoolState<C> {
    idle: Vec<IdleEntry<C>>,
    in_use: usize,
    total: usize,
}

struct PoolInner<A: DriverAdapter> {
    adapter: Arc<A>,
    options: PoolOptions,
    after_create: Option<AfterCreate<A::Connection>>,
    state: Mutex<PoolState<A::Connection>>,
    slots: Arc<Semaphore>,
    next_uid: AtomicU64,
    closed: AtomicBool,
    reaper_started: AtomicBool,
}

pub struct Pool<A: DriverAdapter> {
    inner: Arc<PoolInner<A>>,
}

impl<A: DriverAdapter> Clone for Pool<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: DriverAdapter> Pool<A> {
    pub fn new(adapter: Arc<A>, options: PoolOptions) -> Self {
        Self::with_after_create(adapter, options, None)
    }

    pub fn with_after_create(
        adapter: Arc<A>,
        options: PoolOptions,
        after_create: Option<AfterCreate<A::Connection>>,
    ) -> Self {
        let inner = Arc::new(PoolInner {
            adapter,
            slots: Arc::new(Semaphore::new(options.max)),
            options,
            after_create,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                in_use: 0,
                total: 0,
            }),
            next_uid: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            reaper_started: AtomicBool::new(false),
        });
        let pool = Self { inner };
        // The reaper needs a runtime; clients may be constructed before one
        // exists, in which case the first acquire starts it.
        pool.start_reaper();
        pool
    }

    fn start_reaper(&self) {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            if !self.inner.reaper_started.swap(true, Ordering::SeqCst) {
                handle.spawn(reap_loop(Arc::downgrade(&self.inner)));
            }
        }
    }

    /// Acquire a connection: an idle one, a fresh one up to `max`, or wait
    /// FIFO behind other acquirers, bounded by the acquire timeout.
    pub async fn acquire(&self) -> QuarryResult<PooledConnection<A>> {
        self.start_reaper();
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(QuarryError::connection("pool is closed"));
        }
        let deadline = self.inner.options.acquire_timeout;
        tokio::time::timeout(deadline, self.acquire_inner())
            .await
            .map_err(|_| {
                QuarryError::Timeout(format!(
                    "could not acquire a connection within {:?}",
                    deadline
                ))
            })?
    }

    async fn acquire_inner(&self) -> QuarryResult<PooledConnection<A>> {
        let permit = self
            .inner
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| QuarryError::connection("pool is closed"))?;

        loop {
            let candidate = {
                let mut state = self.inner.state.lock().await;
                state.idle.pop().map(|entry| entry.conn)
            };

            match candidate {
                Some(mut conn) => {
                    if self
                        .inner
                        .adapter
                        .validate_connection(conn.raw_mut())
                        .await
                    {
                        let mut state = self.inner.state.lock().await;
                        state.in_use += 1;
                        return Ok(PooledConnection {
                            conn: Some(conn),
                            inner: self.inner.clone(),
                            permit: Some(permit),
                        });
                    }
                    tracing::warn!(uid = conn.uid, "connection failed validation, destroying");
                    self.destroy(conn).await;
                }
                None => match self.create().await {
                    Ok(conn) => {
                        let mut state = self.inner.state.lock().await;
                        state.total += 1;
                        state.in_use += 1;
                        return Ok(PooledConnection {
                            conn: Some(conn),
                            inner: self.inner.clone(),
                            permit: Some(permit),
                        });
                    }
                    Err(err) if self.inner.options.propagate_create_error => {
                        return Err(err);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "connection create failed, retrying");
                        tokio::time::sleep(self.inner.options.create_retry_interval).await;
                    }
                },
            }
        }
    }

    async fn create(&self) -> QuarryResult<PoolConn<A::Connection>> {
        let raw = tokio::time::timeout(
            self.inner.options.create_timeout,
            self.inner.adapter.acquire_raw_connection(),
        )
        .await
        .map_err(|_| QuarryError::connection("timed out creating a connection"))??;

        let uid = self.inner.next_uid.fetch_add(1, Ordering::SeqCst) + 1;
        let mut conn = PoolConn {
            uid,
            tx_id: None,
            raw,
        };
        if let Some(hook) = &self.inner.after_create {
            if let Err(err) = hook(conn.raw_mut()) {
                self.destroy_raw(conn).await;
                return Err(err);
            }
        }
        tracing::debug!(uid, "connection created");
        Ok(conn)
    }

    /// Destroy a connection that was counted in `total`.
    async fn destroy(&self, conn: PoolConn<A::Connection>) {
        {
            let mut state = self.inner.state.lock().await;
            state.total = state.total.saturating_sub(1);
        }
        self.destroy_raw(conn).await;
    }

    async fn destroy_raw(&self, conn: PoolConn<A::Connection>) {
        destroy_conn(&self.inner, conn).await;
    }

    pub async fn idle_count(&self) -> usize {
        self.inner.state.lock().await.idle.len()
    }

    pub async fn in_use_count(&self) -> usize {
        self.inner.state.lock().await.in_use
    }

    pub async fn total_count(&self) -> usize {
        self.inner.state.lock().await.total
    }

    /// Close the pool: reject new acquires and destroy idle connections.
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.slots.close();
        let drained: Vec<_> = {
            let mut state = self.inner.state.lock().await;
            let drained = state.idle.drain(..).collect::<Vec<_>>();
            state.total = state.total.saturating_sub(drained.len());
            drained
        };
        for entry in drained {
            destroy_conn(&self.inner, entry.conn).await;
        }
        tracing::debug!("pool closed");
    }
}

async fn destroy_conn<A: DriverAdapter>(inner: &PoolInner<A>, conn: PoolConn<A::Connection>) {
    let uid = conn.uid;
    let result = tokio::time::timeout(
        inner.options.destroy_timeout,
        inner.adapter.destroy_raw_connection(conn.raw),
    )
    .await;
    match result {
        Ok(Ok(())) => tracing::debug!(uid, "connection destroyed"),
        Ok(Err(err)) => tracing::warn!(uid, error = %err, "connection destroy failed"),
        Err(_) => tracing::warn!(uid, "connection destroy timed out"),
    }
}

async fn return_connection<A: DriverAdapter>(
    inner: Arc<PoolInner<A>>,
    conn: PoolConn<A::Connection>,
    permit: OwnedSemaphorePermit,
) {
    let closed = inner.closed.load(Ordering::SeqCst);
    // A connection still wearing a transaction id was dropped mid-flight;
    // its session state is unknown, so it is destroyed, not pooled.
    let poisoned = conn.tx_id.is_some();
    {
        let mut state = inner.state.lock().await;
        state.in_use = state.in_use.saturating_sub(1);
        if !closed && !poisoned {
            state.idle.push(IdleEntry {
                conn,
                since: Instant::now(),
            });
            drop(state);
            drop(permit);
            return;
        }
        state.total = state.total.saturating_sub(1);
    }
    if poisoned {
        tracing::warn!("destroying connection abandoned inside a transaction");
    }
    destroy_conn(&inner, conn).await;
    drop(permit);
}

async fn reap_loop<A: DriverAdapter>(inner: Weak<PoolInner<A>>) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        if inner.closed.load(Ordering::SeqCst) {
            return;
        }
        let evicted: Vec<_> = {
            let mut state = inner.state.lock().await;
            let min = inner.options.min;
            let idle_timeout = inner.options.idle_timeout;
            let mut evicted = Vec::new();
            while state.total > min {
                // Oldest idle entries sit at the front of the LIFO stack.
                match state.idle.first() {
                    Some(entry) if entry.since.elapsed() > idle_timeout => {
                        let entry = state.idle.remove(0);
                        state.total -= 1;
                        evicted.push(entry.conn);
                    }
                    _ => break,
                }
            }
            evicted
        };
        for conn in evicted {
            tracing::debug!(uid = conn.uid, "evicting idle connection");
            destroy_conn(&inner, conn).await;
        }
    }
}

/// RAII guard over an acquired connection; returns it to the pool on drop.
pub struct PooledConnection<A: DriverAdapter> {
    conn: Option<PoolConn<A::Connection>>,
    inner: Arc<PoolInner<A>>,
    permit: Option<OwnedSemaphorePermit>,
}

impl<A: DriverAdapter> std::fmt::Debug for PooledConnection<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection").finish_non_exhaustive()
    }
}

impl<A: DriverAdapter> PooledConnection<A> {
    pub fn conn(&self) -> &PoolConn<A::Connection> {
        self.conn.as_ref().expect("connection present until drop")
    }

    pub fn conn_mut(&mut self) -> &mut PoolConn<A::Connection> {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<A: DriverAdapter> std::ops::Deref for PooledConnection<A> {
    type Target = PoolConn<A::Connection>;

    fn deref(&self) -> &Self::Target {
        self.conn()
    }
}

impl<A: DriverAdapter> std::ops::DerefMut for PooledConnection<A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn_mut()
    }
}

impl<A: DriverAdapter> Drop for PooledConnection<A> {
    fn drop(&mut self) {
        if let (Some(conn), Some(permit)) = (self.conn.take(), self.permit.take()) {
            let inner = self.inner.clone();
            tokio::spawn(return_connection(inner, conn, permit));
        }
    }
}
