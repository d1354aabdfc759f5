//! Dialect strategy objects.
//!
//! A dialect is a value object encapsulating every backend-specific
//! behavior: identifier quoting, placeholder style, feature flags, rewrite
//! hooks, logical type mapping, and driver error normalization. Dialects are
//! stateless; the registry hands out shared `'static` references.

mod cockroach;
mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod redshift;
mod sqlite;

pub use cockroach::CockroachDialect;
pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use redshift::RedshiftDialect;
pub use sqlite::SqliteDialect;

use crate::ast::{LockClause, LockStrength, Value};
use crate::error::{ConstraintKind, QuarryError, QuarryResult};
use crate::types::ColumnType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A raw error reported by a driver, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// Backend code: SQLSTATE, errno, or whatever the driver exposes.
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

/// How the dialect spells its upsert clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSyntax {
    /// `on conflict (...) do nothing | do update set ...` with `excluded.*`.
    OnConflict,
    /// `insert ignore` / `on duplicate key update c = values(c)`.
    OnDuplicateKey,
}

impl std::fmt::Debug for dyn Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialect").field("name", &self.name()).finish()
    }
}

pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Quote one identifier segment. Dotted references are split before this
    /// is called, so each segment is quoted exactly once.
    fn quote_identifier(&self, segment: &str) -> String {
        format!("\"{}\"", segment.replace('"', "\"\""))
    }

    /// Placeholder for the 1-based binding index.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    // Feature flags --------------------------------------------------------

    fn supports_returning(&self) -> bool {
        false
    }
    fn supports_cte(&self) -> bool {
        true
    }
    fn supports_recursive_cte(&self) -> bool {
        true
    }
    fn supports_materialized_cte(&self) -> bool {
        false
    }
    fn supports_json_path(&self) -> bool {
        false
    }
    fn supports_on_conflict(&self) -> bool {
        false
    }
    fn supports_update_from(&self) -> bool {
        false
    }
    fn supports_for_update_of_tables(&self) -> bool {
        false
    }
    fn supports_skip_locked(&self) -> bool {
        false
    }
    fn supports_distinct_on(&self) -> bool {
        false
    }
    /// Named WINDOW clause and window-function projections over it.
    fn supports_window(&self) -> bool {
        false
    }
    fn supports_ilike(&self) -> bool {
        false
    }
    fn supports_boolean(&self) -> bool {
        true
    }
    /// Whether missing insert cells become NULL without an explicit opt-in.
    fn inserts_undefined_as_null(&self) -> bool {
        false
    }
    /// NULLS FIRST/LAST in ORDER BY.
    fn supports_order_nulls(&self) -> bool {
        false
    }
    /// `select top (n)` instead of a trailing LIMIT when there is no offset.
    fn uses_top(&self) -> bool {
        false
    }
    /// True when `limit_offset` renders the offset before the limit
    /// (OFFSET/FETCH dialects); keeps binding order aligned with the text.
    fn offset_binds_first(&self) -> bool {
        false
    }

    // Rewrite hooks --------------------------------------------------------

    fn bool_literal(&self, value: bool) -> String {
        if self.supports_boolean() {
            value.to_string()
        } else if value {
            "1".to_string()
        } else {
            "0".to_string()
        }
    }

    /// The operator emitted for case-insensitive LIKE.
    fn ilike_operator(&self) -> &'static str {
        if self.supports_ilike() {
            "ilike"
        } else {
            "like"
        }
    }

    /// Render the paging tail. `limit`/`offset` arrive as placeholder or
    /// literal text, already decided by the compiler.
    fn limit_offset(&self, limit: Option<String>, offset: Option<String>) -> String {
        let mut sql = String::new();
        if let Some(l) = limit {
            sql.push_str(&format!(" limit {}", l));
        }
        if let Some(o) = offset {
            sql.push_str(&format!(" offset {}", o));
        }
        sql
    }

    /// Multi-argument `count(distinct ...)`; dialects without native support
    /// rewrite to a concatenation.
    fn count_distinct(&self, args: &[String]) -> String {
        format!("count(distinct {})", args.join(", "))
    }

    fn conflict_syntax(&self) -> ConflictSyntax {
        ConflictSyntax::OnConflict
    }

    /// Reference to the incoming row inside a merge clause.
    fn excluded_column(&self, quoted_column: &str) -> String {
        format!("excluded.{}", quoted_column)
    }

    /// Locking clause for the given request, or `None` when unsupported;
    /// the compiler omits unsupported locks rather than failing.
    /// `of_tables` arrives already quoted, and already emptied when the
    /// dialect lacks `supports_for_update_of_tables`.
    fn lock_clause(&self, _lock: &LockClause, _of_tables: &[String]) -> Option<String> {
        None
    }

    fn truncate_statement(&self, table: &str) -> String {
        format!("truncate {}", table)
    }

    // JSON rendering -------------------------------------------------------

    /// Scalar extraction at a JSON path, used by json-path predicates.
    fn json_path_extract(&self, quoted_column: &str, path: &str) -> String {
        format!("json_value({}, '{}')", quoted_column, path)
    }

    /// Superset test: the column's document contains the placeholder's.
    /// `None` when the backend has no containment form.
    fn json_contains_expr(&self, _quoted_column: &str, _placeholder: &str) -> Option<String> {
        None
    }

    /// Subset test: the column's document is contained in the placeholder's.
    fn json_contained_expr(&self, _quoted_column: &str, _placeholder: &str) -> Option<String> {
        None
    }

    // Type mapping ---------------------------------------------------------

    /// Column-declaration string for a logical type.
    fn column_type(&self, ty: &ColumnType) -> String {
        generic_column_type(ty)
    }

    // Value literalization (debug / format only) ---------------------------

    /// Literalize a value for debug output. Never used for execution.
    fn escape_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => self.bool_literal(*b),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Decimal(d) => d.clone(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Bytes(bytes) => {
                let mut out = String::from("x'");
                for byte in bytes {
                    out.push_str(&format!("{:02x}", byte));
                }
                out.push('\'');
                out
            }
            Value::Date(d) => format!("'{}'", d),
            Value::DateTime(dt) => format!("'{}'", dt),
            Value::Timestamp(ts) => format!("'{}'", ts.to_rfc3339()),
            Value::Uuid(u) => format!("'{}'", u),
            Value::Json(j) => format!("'{}'", j.to_string().replace('\'', "''")),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| self.escape_value(v)).collect();
                format!("({})", parts.join(", "))
            }
            Value::Raw(raw) => raw.sql.clone(),
        }
    }

    // Error normalization --------------------------------------------------

    /// Map a driver error onto the canonical taxonomy. The default
    /// classifies by SQLSTATE class; dialects override for their own codes.
    fn transform_error(&self, err: &DriverError) -> QuarryError {
        transform_sqlstate(err)
    }
}

/// SQLSTATE-class fallback shared by the ANSI-flavored dialects.
pub(crate) fn transform_sqlstate(err: &DriverError) -> QuarryError {
    let Some(code) = err.code.as_deref() else {
        return QuarryError::Driver(err.message.clone());
    };
    match code {
        "23502" => QuarryError::Constraint {
            kind: ConstraintKind::NotNull,
            message: err.message.clone(),
        },
        "23505" => QuarryError::Constraint {
            kind: ConstraintKind::Unique,
            message: err.message.clone(),
        },
        "23503" => QuarryError::Constraint {
            kind: ConstraintKind::ForeignKey,
            message: err.message.clone(),
        },
        "23514" => QuarryError::Constraint {
            kind: ConstraintKind::Check,
            message: err.message.clone(),
        },
        "57014" => QuarryError::Cancelled(err.message.clone()),
        _ if code.starts_with("42") => QuarryError::Syntax(err.message.clone()),
        _ if code.starts_with("08") => QuarryError::Connection(err.message.clone()),
        _ => QuarryError::Driver(err.message.clone()),
    }
}

/// ANSI-ish defaults each dialect starts from.
pub(crate) fn generic_column_type(ty: &ColumnType) -> String {
    match ty {
        ColumnType::Increments => "integer not null primary key".to_string(),
        ColumnType::BigIncrements => "bigint not null primary key".to_string(),
        ColumnType::Integer => "integer".to_string(),
        ColumnType::TinyInt => "tinyint".to_string(),
        ColumnType::SmallInt => "smallint".to_string(),
        ColumnType::MediumInt => "mediumint".to_string(),
        ColumnType::BigInteger => "bigint".to_string(),
        ColumnType::Text => "text".to_string(),
        ColumnType::String(n) => format!("varchar({})", n),
        ColumnType::Float => "float".to_string(),
        ColumnType::Double => "double precision".to_string(),
        ColumnType::Decimal(p, s) => format!("decimal({}, {})", p, s),
        ColumnType::Boolean => "boolean".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::DateTime => "datetime".to_string(),
        ColumnType::Time => "time".to_string(),
        ColumnType::Timestamp => "timestamp".to_string(),
        ColumnType::Geometry => "geometry".to_string(),
        ColumnType::Geography => "geography".to_string(),
        ColumnType::Point => "point".to_string(),
        ColumnType::Binary(n) => format!("varbinary({})", n),
        ColumnType::Enum(_) => "text".to_string(),
        ColumnType::Json => "json".to_string(),
        ColumnType::Jsonb => "json".to_string(),
        ColumnType::Uuid => "char(36)".to_string(),
    }
}

// Registry -----------------------------------------------------------------

static POSTGRES: PostgresDialect = PostgresDialect;
static MYSQL: MysqlDialect = MysqlDialect;
static SQLITE: SqliteDialect = SqliteDialect;
static MSSQL: MssqlDialect = MssqlDialect;
static ORACLE: OracleDialect = OracleDialect;
static REDSHIFT: RedshiftDialect = RedshiftDialect;
static COCKROACH: CockroachDialect = CockroachDialect;

/// Process-global dialect registry, initialized once from a static table.
static REGISTRY: Lazy<HashMap<&'static str, &'static dyn Dialect>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, &'static dyn Dialect> = HashMap::new();
    map.insert("pg", &POSTGRES);
    map.insert("postgres", &POSTGRES);
    map.insert("postgresql", &POSTGRES);
    map.insert("mysql", &MYSQL);
    map.insert("mysql2", &MYSQL);
    map.insert("mariadb", &MYSQL);
    map.insert("sqlite", &SQLITE);
    map.insert("sqlite3", &SQLITE);
    map.insert("better-sqlite", &SQLITE);
    map.insert("better-sqlite3", &SQLITE);
    map.insert("node-sqlite", &SQLITE);
    map.insert("mssql", &MSSQL);
    map.insert("oracle", &ORACLE);
    map.insert("oracledb", &ORACLE);
    map.insert("redshift", &REDSHIFT);
    map.insert("cockroachdb", &COCKROACH);
    map
});

/// Resolve a client name to its dialect. Unknown names fail fast.
pub fn resolve_dialect(name: &str) -> QuarryResult<&'static dyn Dialect> {
    REGISTRY.get(name).copied().ok_or_else(|| {
        QuarryError::config(format!(
            "unknown client '{}'; expected one of: pg, mysql, sqlite, mssql, oracle, redshift, cockroachdb",
            name
        ))
    })
}

/// Standard lock-clause renderer shared by the dialects that support the
/// full strength set. `of_tables` comes in pre-quoted.
pub(crate) fn standard_lock_clause(
    lock: &LockClause,
    of_tables: &[String],
    skip_locked: bool,
    no_wait: bool,
) -> String {
    let mut sql = match lock.strength {
        LockStrength::Update => " for update".to_string(),
        LockStrength::Share => " for share".to_string(),
        LockStrength::NoKeyUpdate => " for no key update".to_string(),
        LockStrength::KeyShare => " for key share".to_string(),
    };
    if !of_tables.is_empty() {
        sql.push_str(" of ");
        sql.push_str(&of_tables.join(", "));
    }
    if lock.skip_locked && skip_locked {
        sql.push_str(" skip locked");
    } else if lock.no_wait && no_wait {
        sql.push_str(" nowait");
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_names() {
        assert_eq!(resolve_dialect("pg").unwrap().name(), "postgres");
        assert_eq!(resolve_dialect("mysql2").unwrap().name(), "mysql");
        assert_eq!(resolve_dialect("better-sqlite").unwrap().name(), "sqlite");
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        let err = resolve_dialect("access97").unwrap_err();
        assert!(matches!(err, QuarryError::Config(_)));
    }

    #[test]
    fn test_sqlstate_constraint_mapping() {
        let err = transform_sqlstate(&DriverError::new("23505", "duplicate key"));
        assert!(matches!(
            err,
            QuarryError::Constraint {
                kind: ConstraintKind::Unique,
                ..
            }
        ));
    }
}
