use super::{ConflictSyntax, Dialect, DriverError};
use crate::ast::{LockClause, LockStrength};
use crate::error::{ConstraintKind, QuarryError};
use crate::types::ColumnType;

/// MySQL / MariaDB dialect.
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, segment: &str) -> String {
        format!("`{}`", segment.replace('`', "``"))
    }

    fn supports_json_path(&self) -> bool {
        true
    }

    fn supports_on_conflict(&self) -> bool {
        true
    }

    fn supports_skip_locked(&self) -> bool {
        true
    }

    fn supports_window(&self) -> bool {
        true
    }

    fn supports_for_update_of_tables(&self) -> bool {
        true
    }

    fn inserts_undefined_as_null(&self) -> bool {
        true
    }

    fn conflict_syntax(&self) -> ConflictSyntax {
        ConflictSyntax::OnDuplicateKey
    }

    fn excluded_column(&self, quoted_column: &str) -> String {
        format!("values({})", quoted_column)
    }

    fn lock_clause(&self, lock: &LockClause, of_tables: &[String]) -> Option<String> {
        let mut sql = match lock.strength {
            LockStrength::Update | LockStrength::NoKeyUpdate => " for update".to_string(),
            LockStrength::Share | LockStrength::KeyShare => " for share".to_string(),
        };
        if !of_tables.is_empty() {
            sql.push_str(" of ");
            sql.push_str(&of_tables.join(", "));
        }
        if lock.skip_locked {
            sql.push_str(" skip locked");
        } else if lock.no_wait {
            sql.push_str(" nowait");
        }
        Some(sql)
    }

    fn json_path_extract(&self, quoted_column: &str, path: &str) -> String {
        format!("json_value({}, '{}')", quoted_column, path)
    }

    fn json_contains_expr(&self, quoted_column: &str, placeholder: &str) -> Option<String> {
        Some(format!("json_contains({}, {})", quoted_column, placeholder))
    }

    fn json_contained_expr(&self, quoted_column: &str, placeholder: &str) -> Option<String> {
        Some(format!("json_contains({}, {})", placeholder, quoted_column))
    }

    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Increments => "int unsigned not null auto_increment primary key".to_string(),
            ColumnType::BigIncrements => {
                "bigint unsigned not null auto_increment primary key".to_string()
            }
            ColumnType::Text => "text".to_string(),
            ColumnType::Double => "double".to_string(),
            ColumnType::Boolean => "boolean".to_string(),
            ColumnType::Timestamp => "timestamp".to_string(),
            ColumnType::Binary(n) => format!("varbinary({})", n),
            ColumnType::Enum(variants) => {
                let quoted: Vec<String> = variants
                    .iter()
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect();
                format!("enum({})", quoted.join(", "))
            }
            ColumnType::Json | ColumnType::Jsonb => "json".to_string(),
            other => super::generic_column_type(other),
        }
    }

    fn transform_error(&self, err: &DriverError) -> QuarryError {
        let constraint = |kind| QuarryError::Constraint {
            kind,
            message: err.message.clone(),
        };
        match err.code.as_deref() {
            Some("1048") | Some("1364") => constraint(ConstraintKind::NotNull),
            Some("1062") | Some("1169") => constraint(ConstraintKind::Unique),
            Some("1216") | Some("1217") | Some("1451") | Some("1452") => {
                constraint(ConstraintKind::ForeignKey)
            }
            Some("3819") => constraint(ConstraintKind::Check),
            Some("1064") => QuarryError::Syntax(err.message.clone()),
            Some("1317") => QuarryError::Cancelled(err.message.clone()),
            _ => super::transform_sqlstate(err),
        }
    }
}
