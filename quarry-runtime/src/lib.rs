//! Execution runtime for quarry: driver adapter contract, bounded
//! connection pool, transactions, and the query runner.
//!
//! A single fluent chain composed with `quarry-core` ends in an awaited
//! database result here:
//!
//! ```ignore
//! use quarry_runtime::{Client, Config};
//!
//! let client = Client::new(Config::new("pg"), adapter)?;
//! let rows = client
//!     .fetch_all(&client.query("users").where_eq("active", true))
//!     .await?;
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod events;
pub mod pool;
pub mod runner;
pub mod stream;
pub mod transaction;

pub use adapter::{DriverAdapter, ExecuteOutcome, Row};
pub use client::Client;
pub use config::{Config, ConnectionSpec, LogOptions};
pub use events::{Event, QueryEvent};
pub use pool::{Pool, PoolConn, PoolOptions, PooledConnection};
pub use runner::DmlResult;
pub use stream::RowStream;
pub use transaction::{IsolationLevel, Transaction, TransactionOptions};

pub use quarry_core::{
    ast::Query, CompiledQuery, Dialect, DriverError, Method, QuarryError, QuarryResult,
};
