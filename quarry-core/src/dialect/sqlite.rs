use super::{Dialect, DriverError};
use crate::error::{ConstraintKind, QuarryError};
use crate::types::ColumnType;

/// SQLite dialect.
///
/// RETURNING is deliberately off: DML responses fall back to
/// `last_insert_rowid` / changed-row counts, which the runner fabricates
/// into the shape the caller asked for.
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports_materialized_cte(&self) -> bool {
        true
    }

    fn supports_json_path(&self) -> bool {
        true
    }

    fn supports_on_conflict(&self) -> bool {
        true
    }

    fn supports_window(&self) -> bool {
        true
    }

    fn supports_boolean(&self) -> bool {
        false
    }

    fn count_distinct(&self, args: &[String]) -> String {
        // No multi-argument distinct; concatenate instead.
        format!("count(distinct {})", args.join(" || "))
    }

    fn truncate_statement(&self, table: &str) -> String {
        format!("delete from {}", table)
    }

    fn json_path_extract(&self, quoted_column: &str, path: &str) -> String {
        format!("json_extract({}, '{}')", quoted_column, path)
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments | ColumnType::BigIncrements => {
                "integer not null primary key autoincrement".to_string()
            }
            ColumnType::TinyInt
            | ColumnType::SmallInt
            | ColumnType::MediumInt
            | ColumnType::BigInteger => "integer".to_string(),
            ColumnType::String(_) | ColumnType::Uuid => "text".to_string(),
            ColumnType::Float | ColumnType::Double => "real".to_string(),
            ColumnType::Boolean => "integer".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::Date | ColumnType::Time => {
                "text".to_string()
            }
            ColumnType::Binary(_) => "blob".to_string(),
            ColumnType::Json | ColumnType::Jsonb => "text".to_string(),
            other => super::generic_column_type(other),
        }
    }

    fn transform_error(&self, err: &DriverError) -> QuarryError {
        // SQLite reports constraint classes in the message text.
        let message = err.message.as_str();
        let constraint = |kind| QuarryError::Constraint {
            kind,
            message: message.to_string(),
        };
        if message.contains("NOT NULL constraint failed") {
            constraint(ConstraintKind::NotNull)
        } else if message.contains("UNIQUE constraint failed") {
            constraint(ConstraintKind::Unique)
        } else if message.contains("FOREIGN KEY constraint failed") {
            constraint(ConstraintKind::ForeignKey)
        } else if message.contains("CHECK constraint failed") {
            constraint(ConstraintKind::Check)
        } else if message.contains("syntax error") {
            QuarryError::Syntax(message.to_string())
        } else if message.contains("interrupted") {
            QuarryError::Cancelled(message.to_string())
        } else {
            QuarryError::Driver(message.to_string())
        }
    }
}
