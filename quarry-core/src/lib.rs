//! Dialect-aware SQL query builder.
//!
//! Compose queries as a typed AST through a fluent builder, then compile
//! them against a dialect into SQL text plus ordered bindings.
//!
//! ```ignore
//! use quarry_core::prelude::*;
//!
//! let compiled = Query::from_table("users")
//!     .select(["name"])
//!     .where_eq("id", 1)
//!     .to_sql(resolve_dialect("pg")?)?;
//! assert_eq!(compiled.sql, r#"select "name" from "users" where "id" = $1"#);
//! ```

pub mod ast;
pub mod builder;
pub mod compiled;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod types;

pub use ast::Query;
pub use compiled::{CompiledQuery, Method};
pub use compiler::CompileOptions;
pub use dialect::{resolve_dialect, Dialect, DriverError};
pub use error::{ConstraintKind, QuarryError, QuarryResult};

pub mod prelude {
    pub use crate::ast::{
        ColumnDef, JoinKind, NullsOrder, Operator, Query, Raw, SetOpKind, SortDirection, Value,
        WindowDef,
    };
    pub use crate::builder::{ClauseSlot, OnBuilder};
    pub use crate::compiled::{CompiledQuery, Method};
    pub use crate::compiler::CompileOptions;
    pub use crate::dialect::{resolve_dialect, Dialect, DriverError};
    pub use crate::error::{ConstraintKind, QuarryError, QuarryResult};
    pub use crate::types::ColumnType;
}
