//! Query lifecycle events.

use quarry_core::ast::Value;
use quarry_core::Method;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Payload shared by the query events.
#[derive(Debug, Clone)]
pub struct QueryEvent {
    pub uid: u64,
    pub tx_id: Option<Uuid>,
    pub sql: String,
    pub bindings: Vec<Value>,
    pub method: Method,
}

#[derive(Debug, Clone)]
pub enum Event {
    /// The client finished construction.
    Start,
    /// A compiled query is about to execute.
    Query(QueryEvent),
    QueryResponse { query: QueryEvent, rows: usize },
    QueryError { query: QueryEvent, message: String },
}

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Fan-out of lifecycle events to registered listeners, with tracing as the
/// always-on sink.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, listener: impl Fn(&Event) + Send + Sync + 'static) {
        self.listeners
            .write()
            .expect("event listener lock")
            .push(Arc::new(listener));
    }

    pub fn emit(&self, event: &Event) {
        match event {
            Event::Start => tracing::debug!("client started"),
            Event::Query(q) => {
                tracing::debug!(uid = q.uid, tx_id = ?q.tx_id, method = %q.method, sql = %q.sql, "query")
            }
            Event::QueryResponse { query, rows } => {
                tracing::debug!(uid = query.uid, rows, "query-response")
            }
            Event::QueryError { query, message } => {
                tracing::warn!(uid = query.uid, sql = %query.sql, %message, "query-error")
            }
        }
        let listeners = self.listeners.read().expect("event listener lock");
        for listener in listeners.iter() {
            listener(event);
        }
    }
}
