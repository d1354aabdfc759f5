use super::{standard_lock_clause, Dialect};
use crate::ast::LockClause;
use crate::types::ColumnType;

/// PostgreSQL dialect.
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn supports_returning(&self) -> bool {
        true
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

    fn supports_update_from(&self) -> bool {
        true
    }

    fn supports_for_update_of_tables(&self) -> bool {
        true
    }

    fn supports_skip_locked(&self) -> bool {
        true
    }

    fn supports_distinct_on(&self) -> bool {
        true
    }

    fn supports_window(&self) -> bool {
        true
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn supports_order_nulls(&self) -> bool {
        true
    }

    fn lock_clause(&self, lock: &LockClause, of_tables: &[String]) -> Option<String> {
        Some(standard_lock_clause(lock, of_tables, true, true))
    }

    fn json_path_extract(&self, quoted_column: &str, path: &str) -> String {
        format!("jsonb_path_query_first({}, '{}')", quoted_column, path)
    }

    fn json_contains_expr(&self, quoted_column: &str, placeholder: &str) -> Option<String> {
        Some(format!("{} @> {}::jsonb", quoted_column, placeholder))
    }

    fn json_contained_expr(&self, quoted_column: &str, placeholder: &str) -> Option<String> {
        Some(format!("{} <@ {}::jsonb", quoted_column, placeholder))
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments => "serial primary key".to_string(),
            ColumnType::BigIncrements => "bigserial primary key".to_string(),
            ColumnType::TinyInt | ColumnType::SmallInt => "smallint".to_string(),
            ColumnType::MediumInt => "integer".to_string(),
            ColumnType::Float => "real".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "timestamptz".to_string(),
            ColumnType::Binary(_) => "bytea".to_string(),
            ColumnType::Json => "json".to_string(),
            ColumnType::Jsonb => "jsonb".to_string(),
            ColumnType::Uuid => "uuid".to_string(),
            other => super::generic_column_type(other),
        }
    }
}
