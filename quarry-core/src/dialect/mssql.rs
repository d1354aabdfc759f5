use super::{Dialect, DriverError};
use crate::error::{ConstraintKind, QuarryError};
use crate::types::ColumnType;

/// SQL Server dialect.
pub struct MssqlDialect;

impl Dialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_identifier(&self, segment: &str) -> String {
        format!("[{}]", segment.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn supports_materialized_cte(&self) -> bool {
        false
    }

    fn supports_boolean(&self) -> bool {
        false
    }

    fn supports_on_conflict(&self) -> bool {
        false
    }

    fn uses_top(&self) -> bool {
        true
    }

    fn offset_binds_first(&self) -> bool {
        true
    }

    fn count_distinct(&self, args: &[String]) -> String {
        if args.len() > 1 {
            format!("count(distinct concat({}))", args.join(", "))
        } else {
            format!("count(distinct {})", args.join(", "))
        }
    }

    fn limit_offset(&self, limit: Option<String>, offset: Option<String>) -> String {
        // OFFSET/FETCH form; plain TOP is handled at the select head.
        match (limit, offset) {
            (Some(l), Some(o)) => format!(" offset {} rows fetch next {} rows only", o, l),
            (Some(l), None) => format!(" offset 0 rows fetch next {} rows only", l),
            (None, Some(o)) => format!(" offset {} rows", o),
            (None, None) => String::new(),
        }
    }

    fn truncate_statement(&self, table: &str) -> String {
        format!("truncate table {}", table)
    }

    fn json_path_extract(&self, quoted_column: &str, path: &str) -> String {
        format!("json_value({}, '{}')", quoted_column, path)
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments => "int identity(1,1) primary key".to_string(),
            ColumnType::BigIncrements => "bigint identity(1,1) primary key".to_string(),
            ColumnType::Text => "nvarchar(max)".to_string(),
            ColumnType::String(n) => format!("nvarchar({})", n),
            ColumnType::Double => "float".to_string(),
            ColumnType::Boolean => "bit".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "datetime2".to_string(),
            ColumnType::Binary(n) => format!("varbinary({})", n),
            ColumnType::Json | ColumnType::Jsonb => "nvarchar(max)".to_string(),
            ColumnType::Uuid => "uniqueidentifier".to_string(),
            other => super::generic_column_type(other),
        }
    }

    fn transform_error(&self, err: &DriverError) -> QuarryError {
        let constraint = |kind| QuarryError::Constraint {
            kind,
            message: err.message.clone(),
        };
        match err.code.as_deref() {
            Some("515") => constraint(ConstraintKind::NotNull),
            Some("2601") | Some("2627") => constraint(ConstraintKind::Unique),
            Some("547") => constraint(ConstraintKind::ForeignKey),
            Some("102") | Some("156") => QuarryError::Syntax(err.message.clone()),
            _ => super::transform_sqlstate(err),
        }
    }
}
