//! Client configuration.

use crate::adapter::Row;
use crate::pool::PoolOptions;
use quarry_core::compiler::IdentifierWrapper;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// How to reach the backend; consumed by the driver adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionSpec {
    #[default]
    None,
    Url(String),
    Params(HashMap<String, String>),
}

/// User hook over the rowset before it is handed back.
pub type PostProcess =
    Arc<dyn Fn(Vec<Row>, Option<&serde_json::Value>) -> Vec<Row> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LogOptions {
    pub inspection_depth: usize,
    pub enable_colors: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            inspection_depth: 5,
            enable_colors: false,
        }
    }
}

impl LogOptions {
    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    pub fn deprecate(&self, old: &str, replacement: &str) {
        tracing::warn!("{} is deprecated, use {} instead", old, replacement);
    }
}

#[derive(Clone)]
pub struct Config {
    /// Dialect name; resolved against the registry at client construction.
    pub client: String,
    pub connection: ConnectionSpec,
    pub pool: PoolOptions,
    /// Insert missing columns as NULL (SQLite-leaning dialects).
    pub use_null_as_default: bool,
    /// Default schema for unqualified tables.
    pub search_path: Option<String>,
    /// User override of identifier quoting.
    pub wrap_identifier: Option<IdentifierWrapper>,
    pub post_process_response: Option<PostProcess>,
    /// Capture a creation backtrace and log it with surfaced errors.
    pub async_stack_traces: bool,
    /// Overrides `pool.acquire_timeout` when set.
    pub acquire_connection_timeout: Option<Duration>,
    /// Include the rendered SQL in error messages.
    pub compile_sql_on_error: bool,
    pub log: LogOptions,
}

impl Config {
    pub fn new(client: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            connection: ConnectionSpec::None,
            pool: PoolOptions::default(),
            use_null_as_default: false,
            search_path: None,
            wrap_identifier: None,
            post_process_response: None,
            async_stack_traces: false,
            acquire_connection_timeout: None,
            compile_sql_on_error: true,
            log: LogOptions::default(),
        }
    }

    pub fn connection(mut self, spec: ConnectionSpec) -> Self {
        self.connection = spec;
        self
    }

    pub fn pool(mut self, options: PoolOptions) -> Self {
        self.pool = options;
        self
    }

    pub fn use_null_as_default(mut self, yes: bool) -> Self {
        self.use_null_as_default = yes;
        self
    }

    pub fn search_path(mut self, schema: impl Into<String>) -> Self {
        self.search_path = Some(schema.into());
        self
    }

    pub fn acquire_connection_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_connection_timeout = Some(timeout);
        self
    }

    pub fn compile_sql_on_error(mut self, yes: bool) -> Self {
        self.compile_sql_on_error = yes;
        self
    }

    pub fn post_process_response(mut self, hook: PostProcess) -> Self {
        self.post_process_response = Some(hook);
        self
    }

    pub fn wrap_identifier(mut self, wrap: IdentifierWrapper) -> Self {
        self.wrap_identifier = Some(wrap);
        self
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client", &self.client)
            .field("connection", &self.connection)
            .field("pool", &self.pool)
            .field("use_null_as_default", &self.use_null_as_default)
            .field("search_path", &self.search_path)
            .field("compile_sql_on_error", &self.compile_sql_on_error)
            .finish()
    }
}
