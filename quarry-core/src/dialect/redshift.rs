use super::{standard_lock_clause, Dialect};
use crate::ast::LockClause;
use crate::types::ColumnType;

/// Amazon Redshift dialect: PostgreSQL-shaped, minus RETURNING, row
/// locking extras and jsonb.
pub struct RedshiftDialect;

impl Dialect for RedshiftDialect {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn supports_distinct_on(&self) -> bool {
        false
    }

    fn supports_order_nulls(&self) -> bool {
        true
    }

    fn lock_clause(&self, lock: &LockClause, of_tables: &[String]) -> Option<String> {
        Some(standard_lock_clause(lock, of_tables, false, false))
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments => "integer identity(1,1) primary key".to_string(),
            ColumnType::BigIncrements => "bigint identity(1,1) primary key".to_string(),
            ColumnType::Text => "varchar(max)".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "timestamptz".to_string(),
            ColumnType::Binary(_) => "varbyte".to_string(),
            ColumnType::Json | ColumnType::Jsonb => "super".to_string(),
            ColumnType::Uuid => "char(36)".to_string(),
            other => super::generic_column_type(other),
        }
    }
}
