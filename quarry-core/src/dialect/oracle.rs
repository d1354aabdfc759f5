use super::{Dialect, DriverError};
use crate::error::{ConstraintKind, QuarryError};
use crate::types::ColumnType;

/// Oracle dialect.
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn placeholder(&self, index: usize) -> String {
        format!(":{}", index)
    }

    fn supports_boolean(&self) -> bool {
        false
    }

    fn supports_order_nulls(&self) -> bool {
        true
    }

    fn offset_binds_first(&self) -> bool {
        true
    }

    fn limit_offset(&self, limit: Option<String>, offset: Option<String>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!(" offset {} rows fetch next {} rows only", o, l),
            (Some(l), None) => format!(" fetch next {} rows only", l),
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
            ColumnType::Increments => "number(10) generated by default as identity primary key".to_string(),
            ColumnType::BigIncrements => "number(20) generated by default as identity primary key".to_string(),
            ColumnType::Integer | ColumnType::MediumInt => "number(10)".to_string(),
            ColumnType::TinyInt => "number(3)".to_string(),
            ColumnType::SmallInt => "number(5)".to_string(),
            ColumnType::BigInteger => "number(20)".to_string(),
            ColumnType::Text => "clob".to_string(),
            ColumnType::String(n) => format!("varchar2({})", n),
            ColumnType::Float => "binary_float".to_string(),
            ColumnType::Double => "binary_double".to_string(),
            ColumnType::Decimal(p, s) => format!("number({}, {})", p, s),
            ColumnType::Boolean => "number(1)".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "timestamp with time zone".to_string(),
            ColumnType::Binary(n) => format!("raw({})", n),
            ColumnType::Json | ColumnType::Jsonb => "clob".to_string(),
            ColumnType::Uuid => "char(36)".to_string(),
            other => super::generic_column_type(other),
        }
    }

    fn transform_error(&self, err: &DriverError) -> QuarryError {
        let constraint = |kind| QuarryError::Constraint {
            kind,
            message: err.message.clone(),
        };
        match err.code.as_deref() {
            Some("1400") | Some("1407") => constraint(ConstraintKind::NotNull),
            Some("1") => constraint(ConstraintKind::Unique),
            Some("2291") | Some("2292") => constraint(ConstraintKind::ForeignKey),
            Some("2290") => constraint(ConstraintKind::Check),
            Some("900") | Some("923") | Some("933") => QuarryError::Syntax(err.message.clone()),
            Some("1013") => QuarryError::Cancelled(err.message.clone()),
            _ => super::transform_sqlstate(err),
        }
    }
}
